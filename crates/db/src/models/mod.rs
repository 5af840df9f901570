//! Entity models. Field names are storage column names; API-shaped
//! (camelCase) inputs convert into them through the `*ApiModel` types.

pub mod admin;
pub mod attendance;
pub mod category;
pub mod checkout_item;
pub mod checkout_object;
pub mod event;
pub mod extra_credit;
pub mod hackathon;
pub mod location;
pub mod organizer;
pub mod pre_registration;
pub mod project;
pub mod registration;
pub mod rsvp;
pub mod scanner;
pub mod statistics;
pub mod travel_reimbursement;
pub mod update;
pub mod workshop_scan;
