pub mod message;
pub mod outcome;
pub mod recipient;
pub mod webhook;
