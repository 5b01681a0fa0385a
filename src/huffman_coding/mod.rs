//! The huffman module builds the code shared by every file of an archive and turns it back
//! into bytes on extraction.
//!
//! One tree is built from the byte counts of all input files together, so a single tree
//! stored in the archive header serves every file section. Its preorder serialization is
//! handled by tree_codec; decoder walks the tree bit by bit.
//!
pub mod decoder;
pub mod huffman;
pub mod tree_codec;
