pub mod grace_period;
