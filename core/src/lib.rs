//! Core types and replay logic for Me-Dot-U-Dot, a two-player game of
//! claiming squares on a board and scoring lines.

pub mod board;
pub mod game;
pub mod listing;
pub mod replay;
pub mod view;
