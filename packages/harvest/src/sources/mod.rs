//! Provider implementations.
//!
//! - `Entrust` - certificate-transparency search (forward and reversed names)
//! - `VirusTotal` - domain information page scrape
//! - `HackerTarget` - host search API

pub mod entrust;
pub mod hackertarget;
pub mod virustotal;

pub use entrust::Entrust;
pub use hackertarget::HackerTarget;
pub use virustotal::VirusTotal;
