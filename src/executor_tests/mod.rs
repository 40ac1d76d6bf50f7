mod helpers;

mod close;
mod shared;
