use std::time::Duration;

use scholar_relay::relay::ReconnectPolicy;
use speculate2::speculate;

speculate! {
    before {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(250), 3);
    }

    describe "next_delay" {
        it "returns the fixed interval while attempts remain" {
            assert_eq!(policy.next_delay(), Some(Duration::from_millis(250)));
            assert_eq!(policy.next_delay(), Some(Duration::from_millis(250)));
            assert_eq!(policy.attempts(), 2);
        }

        it "returns None once the maximum is reached" {
            for _ in 0..3 {
                assert!(policy.next_delay().is_some());
            }
            assert_eq!(policy.next_delay(), None);
            assert!(policy.is_exhausted());
        }

        it "never counts past the maximum" {
            for _ in 0..20 {
                policy.next_delay();
                assert!(policy.attempts() <= policy.max_attempts());
            }
            assert_eq!(policy.attempts(), 3);
        }
    }

    describe "reset" {
        it "restores the full attempt budget" {
            while policy.next_delay().is_some() {}
            policy.reset();

            assert_eq!(policy.attempts(), 0);
            assert!(!policy.is_exhausted());
            assert!(policy.next_delay().is_some());
        }
    }

    describe "default" {
        it "retries every three seconds up to ten times" {
            let policy = ReconnectPolicy::default();
            assert_eq!(policy.interval(), Duration::from_secs(3));
            assert_eq!(policy.max_attempts(), 10);
        }
    }

    describe "zero attempts" {
        it "is exhausted from the start" {
            let mut policy = ReconnectPolicy::new(Duration::from_secs(1), 0);
            assert!(policy.is_exhausted());
            assert_eq!(policy.next_delay(), None);
        }
    }
}
