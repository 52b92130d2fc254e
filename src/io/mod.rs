pub mod gff;
pub mod obo;

pub use gff::{
    read_gff_file,
    read_many,
};
pub use obo::{
    parse_obo,
    read_obo,
    read_obo_file,
};
