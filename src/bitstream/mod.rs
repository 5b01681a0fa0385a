//! The bitstream module is the I/O subsystem of the archiver.
//!
//! Codes are written most significant bit first and each file's payload is padded with zeros
//! to a whole byte. The reader pulls bytes one at a time so that it never reads past the end
//! of the payload it is decoding; see bitreader.rs.
//!
pub mod bitpacker;
pub mod bitreader;
