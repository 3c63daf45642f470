//! What happens outside the board: acting on a selected ticket, and creating
//! a ticket from work already in progress.

pub mod activate;
pub mod create;

pub use activate::activate;
pub use create::CreateOptions;
