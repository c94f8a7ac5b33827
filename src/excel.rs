pub mod container;
pub mod ooxml;
pub mod workbook;
pub mod worksheet;
mod xml;
