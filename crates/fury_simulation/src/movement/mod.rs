//! Movement domain — фасад над портом навигации
//!
//! Содержит:
//! - NavigatorFacade (go_to / chase / step / stuck / detach)

pub mod navigator;

pub use navigator::NavigatorFacade;
