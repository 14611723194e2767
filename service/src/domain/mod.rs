//! Domain definitions.

pub mod catalog;
pub mod checklist;
pub mod customer;
pub mod event;
pub mod payment;
pub mod rental;
pub mod role;

pub use self::{
    catalog::{Product, Tent},
    checklist::ChecklistItem,
    customer::Customer,
    event::Event,
    payment::Payment,
    rental::Rental,
    role::Role,
};
