pub mod scrub;
pub mod xor;
pub mod zuc;
