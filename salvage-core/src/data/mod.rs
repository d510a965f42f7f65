//! External collaborators: VIN decoding, marketplace search, parts list and
//! user instructions.

pub mod ebay;
pub mod instructions;
pub mod parts;
pub mod provider;
pub mod vin;

pub use ebay::{EbayClient, EbayEnvironment, MarketplaceSettings};
pub use instructions::{FileInstructionStore, InstructionStore};
pub use parts::{load_parts, load_parts_or_default, parse_parts};
pub use provider::{search_queries, ListingSource, MarketplaceError, VinDecoder, VinError};
pub use vin::{parse_decode_body, NhtsaDecoder, Vin};
