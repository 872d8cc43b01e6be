mod dashboard;
mod transfer;
mod utils;
