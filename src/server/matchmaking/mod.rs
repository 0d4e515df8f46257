//! Matchmaking: the FIFO waiting queue that pairs sessions into matches.

pub mod queue;
