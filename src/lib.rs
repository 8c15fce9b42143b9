#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod common;
mod config;
mod evaluate;
mod event;
mod game;
mod keyboard;
mod player;
mod word;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
mod remote;
#[cfg(feature = "std")]
mod server;
#[cfg(feature = "std")]
mod session;
#[cfg(feature = "std")]
pub mod store;
#[cfg(feature = "std")]
pub mod transport;
#[cfg(feature = "std")]
mod ui;

pub use common::*;
pub use config::*;
pub use evaluate::*;
pub use event::*;
pub use game::*;
pub use keyboard::*;
pub use player::*;
pub use word::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use protocol::*;
#[cfg(feature = "std")]
pub use remote::*;
#[cfg(feature = "std")]
pub use server::*;
#[cfg(feature = "std")]
pub use session::*;
#[cfg(feature = "std")]
pub use store::*;
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
#[cfg(feature = "std")]
pub use ui::*;
