//! [`Command`] definition.

pub mod add_line_item;
pub mod advance_rental;
pub mod cancel_rental;
pub mod confirm_payment;
pub mod create_rental;
pub mod finalize_rental;
pub mod generate_checklist;
pub mod mark_collected;
pub mod remove_line_item;
pub mod unmark_collected;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_line_item::AddLineItem, advance_rental::AdvanceRental,
    cancel_rental::CancelRental, confirm_payment::ConfirmPayment,
    create_rental::CreateRental, finalize_rental::FinalizeRental,
    generate_checklist::GenerateChecklist, mark_collected::MarkCollected,
    remove_line_item::RemoveLineItem, unmark_collected::UnmarkCollected,
};
