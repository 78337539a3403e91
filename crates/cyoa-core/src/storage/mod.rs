//! Story directories on a FAT-formatted SD card
//!
//! `embedded-sdmmc` only understands 8.3 short names, so story and asset
//! file names on the card must fit that form (`CYOA.JSN`, `DOOR.BMP`).
//! The story file name is configurable for that reason.

mod sd_card;

pub use sd_card::{FixedTimeSource, SdCardSource};
