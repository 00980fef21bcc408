pub mod http;
pub mod linkedin;
pub mod otta;
