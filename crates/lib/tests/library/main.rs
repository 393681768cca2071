//! Library-level pipeline tests: load, plan and execute descriptors
//! against an in-process toolchain.

mod common;
