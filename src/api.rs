pub mod tibber;
