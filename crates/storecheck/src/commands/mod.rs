//! Reusable multi-step commands and the registry that invokes them by name.

mod cart;
mod navigation;
mod registry;

pub use cart::{CartCommands, CartItem, DEFAULT_PACE};
pub use navigation::{ModalAction, NavigationCommands, Section};
pub use registry::{CommandCategory, CommandContext, CommandFuture, CommandHandler, CommandRegistry};
