#![cfg_attr(coverage_nightly, coverage(off))]

use std::time::{Duration, Instant};

use mockall::mock;

use crate::pal::Platform;

mock! {
    #[derive(Debug)]
    pub Platform {
    }

    impl Platform for Platform {
        fn read_counter(&self) -> u64;
        fn counter_frequency(&self) -> crate::Result<u64>;
        fn now(&self) -> Instant;
        fn sleep(&self, duration: Duration);
    }
}
