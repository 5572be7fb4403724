mod common;

use common::{bracketed, events, probe, tx, workload, FakeBoard, Probe, SETUP};
use harness::{BuildVariant, Config, Harness, RunMode, Status};
use simpleserial::{
    error::{Error, Register, Reject},
    Dispatch, Protocol, MAX_PAYLOAD,
};

const RUN: &[u8] = b"141\n";

fn boot(probe: &Probe, config: Config) -> Harness<FakeBoard, impl FnMut()> {
    Harness::init(config, FakeBoard(probe.clone()), workload(probe))
}

fn handled() -> Dispatch {
    Dispatch::Handled { cmd: b'1', status: 0 }
}

mod single_shot {
    use super::*;

    #[test]
    fn skip_flag_set() {
        let probe = probe(RUN);
        let mut harness = boot(&probe, Config::DEFAULT.with_debug_skip_loop(true));

        assert_eq!(RunMode::SingleShot, harness.mode());
        assert_eq!(Ok(Status::Ok), harness.run());

        assert_eq!(bracketed(1), events(&probe));
        assert_eq!(b"Starting\nOK!", tx(&probe).as_slice());
        // the serial port is never read
        assert_eq!(RUN.len(), probe.borrow().rx.len());
    }

    #[test]
    fn single_shot_variant() {
        let probe = probe(&[]);
        let config = Config {
            variant: BuildVariant::SingleShotByDefault,
            ..Config::DEFAULT
        };
        let mut harness = boot(&probe, config);

        assert_eq!(RunMode::SingleShot, harness.mode());
        assert_eq!(Ok(Status::Ok), harness.run());

        assert_eq!(bracketed(1), events(&probe));
    }
}

mod serial_loop {
    use super::*;

    #[test]
    fn banner_then_wait() {
        let probe = probe(&[]);
        let mut harness = boot(&probe, Config::DEFAULT);

        assert_eq!(RunMode::SerialLoop, harness.mode());
        assert_eq!(SETUP.as_slice(), events(&probe).as_slice());
        assert_eq!(b"Starting\n", tx(&probe).as_slice());

        let mut serial = harness.serve().unwrap();
        assert!(matches!(serial.poll(), Err(Error::EndOfStream)));
        assert_eq!(SETUP.as_slice(), events(&probe).as_slice());
    }

    #[test]
    fn run_command() {
        let probe = probe(RUN);
        let mut harness = boot(&probe, Config::DEFAULT);
        let mut serial = harness.serve().unwrap();

        assert_eq!(handled(), serial.poll().unwrap());

        assert_eq!(bracketed(1), events(&probe));
        assert_eq!(b"Starting\nOK!z00\n", tx(&probe).as_slice());

        // back to waiting for the next command
        assert!(matches!(serial.poll(), Err(Error::EndOfStream)));
    }

    #[test]
    fn repeated_commands() {
        let probe = probe(&RUN.repeat(5));
        let mut harness = boot(&probe, Config::DEFAULT);
        let mut serial = harness.serve().unwrap();

        for _ in 0..5 {
            assert_eq!(handled(), serial.poll().unwrap());
        }

        assert_eq!(bracketed(5), events(&probe));

        let mut expected = b"Starting\n".to_vec();
        expected.extend(b"OK!z00\n".repeat(5));
        assert_eq!(expected, tx(&probe));
    }

    #[test]
    fn other_commands_are_ignored() {
        let probe = probe(b"2\n141\n");
        let mut harness = boot(&probe, Config::DEFAULT);
        let mut serial = harness.serve().unwrap();

        assert_eq!(Dispatch::Rejected(Reject::UnknownCommand(b'2')), serial.poll().unwrap());
        assert_eq!(Dispatch::Rejected(Reject::UnknownCommand(b'\n')), serial.poll().unwrap());
        assert_eq!(handled(), serial.poll().unwrap());

        assert_eq!(bracketed(1), events(&probe));
    }

    #[test]
    fn quiet_build() {
        let probe = probe(RUN);
        let mut harness = boot(
            &probe,
            Config {
                debug: false,
                ..Config::DEFAULT
            },
        );
        let mut serial = harness.serve().unwrap();

        assert_eq!(handled(), serial.poll().unwrap());

        assert_eq!(b"z00\n", tx(&probe).as_slice());
    }

    #[test]
    fn protocol_2_1() {
        let probe = probe(&[0x02, 0x31, 0x04, 0x01, 0x41, 0x0b, 0x00]);
        let mut harness = boot(
            &probe,
            Config {
                protocol: Protocol::V2_1,
                ..Config::DEFAULT
            },
        );
        let mut serial = harness.serve().unwrap();

        assert_eq!(handled(), serial.poll().unwrap());

        let mut expected = b"Starting\nOK!".to_vec();
        expected.extend([0x03, 0x65, 0x01, 0x02, 0xeb, 0x00]);
        assert_eq!(expected, tx(&probe));
    }

    #[test]
    fn protocol_2_1_empty_payload() {
        let probe = probe(&[0x02, 0x31, 0x01, 0x02, 0xa6, 0x00]);
        let mut harness = boot(
            &probe,
            Config {
                protocol: Protocol::V2_1,
                ..Config::DEFAULT
            },
        );
        let mut serial = harness.serve().unwrap();

        assert_eq!(Dispatch::Rejected(Reject::Length), serial.poll().unwrap());

        assert_eq!(SETUP.as_slice(), events(&probe).as_slice());
        let mut expected = b"Starting\n".to_vec();
        expected.extend([0x05, 0x65, 0x01, 0x04, 0x92, 0x00]);
        assert_eq!(expected, tx(&probe));
    }

    #[test]
    fn unregistrable_command() {
        let probe = probe(RUN);
        let mut harness = boot(
            &probe,
            Config {
                payload_len: MAX_PAYLOAD + 1,
                ..Config::DEFAULT
            },
        );

        assert_eq!(Err(Register::PayloadTooLong), harness.run());
        assert_eq!(SETUP.as_slice(), events(&probe).as_slice());
    }
}
