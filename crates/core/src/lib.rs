pub mod config;
pub mod config_loader;
pub mod events;
pub mod reply;
pub mod signal;
pub mod traits;

pub use config::{AppConfig, DedupConfig, StoreConfig};
pub use config_loader::ConfigLoader;
pub use events::MessageEvent;
pub use reply::ReplyAction;
pub use signal::{CloseReason, OptionType, Signal, SignalStatus, TradeAction};
pub use traits::{
    InstrumentResolver, OptionContract, OrderGateway, OrderReceipt, OrderSpec, OrderType,
};
