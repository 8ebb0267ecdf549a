use std::fs::File;
use std::io::{self, BufReader, Read};

use commprims_exchange::LatestSink;
use commprims_frame::{
    ChecksumValidator, FrameLayout, FrameResynchronizer, FrameValidator, RawFrame,
    SentinelValidator,
};
use commprims_pipeline::{
    FailurePolicy, Monitor, MonitorConfig, RawFramePacker, ReaderTask, Result as TaskResult,
    TaskError, TaskSummary,
};
use tracing::info;

use crate::cmd::ScanArgs;
use crate::exit::{frame_error, io_error, task_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Validator picked at runtime from the command line.
#[derive(Debug, Clone, Copy)]
enum ScanValidator {
    Sentinel(SentinelValidator),
    Checksum(ChecksumValidator),
}

impl ScanValidator {
    fn new(layout: FrameLayout, checksum: bool) -> Self {
        if checksum {
            Self::Checksum(ChecksumValidator::new(layout))
        } else {
            Self::Sentinel(SentinelValidator::new(layout))
        }
    }
}

impl FrameValidator for ScanValidator {
    fn validate(&self, window: &[u8]) -> bool {
        match self {
            Self::Sentinel(v) => v.validate(window),
            Self::Checksum(v) => v.validate(window),
        }
    }
}

/// Prints every recovered frame as it arrives.
struct FramePrinter {
    format: OutputFormat,
    printed: u64,
}

impl LatestSink<RawFrame> for FramePrinter {
    fn push(&mut self, frame: RawFrame) {
        print_frame(self.printed, &frame, self.format);
        self.printed += 1;
    }
}

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    let input: Box<dyn Read> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let sink = FramePrinter { format, printed: 0 };
    let summary = scan(&args, input, sink)?;
    info!(
        frames = summary.delivered,
        misses = summary.misses,
        windows = summary.iterations,
        "scan finished"
    );

    if summary.delivered == 0 {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

/// Run the reader loop over `input`, pushing recovered frames into `sink`.
///
/// End of input ends the scan normally; any other stream failure is an error.
fn scan<R, K>(args: &ScanArgs, input: R, sink: K) -> CliResult<TaskSummary>
where
    R: Read,
    K: LatestSink<RawFrame>,
{
    let layout = args.sentinels.layout(args.payload_size)?;
    let validator = ScanValidator::new(layout, args.sentinels.checksum);
    let resync = FrameResynchronizer::for_layout(&layout, validator)
        .map_err(|err| frame_error("invalid frame layout", err))?;

    let mut task = ReaderTask::new(input, RawFramePacker::new(resync), sink);
    let mut policy = FailurePolicy::new(MonitorConfig {
        max_consecutive_misses: args.max_misses,
        max_delivered: args.count,
        ..MonitorConfig::default()
    });

    let mut fatal = None;
    let summary = task.run(&mut |outcome: &TaskResult<()>| {
        if let Err(err) = outcome {
            if err.is_io() && !matches!(err, TaskError::SourceClosed) {
                fatal = Some(task_error("read failed", err));
            }
        }
        policy.handle(outcome)
    });

    match fatal {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::cmd::encode::build_frame;
    use crate::cmd::SentinelArgs;

    use super::*;

    fn args(checksum: bool) -> ScanArgs {
        ScanArgs {
            input: None,
            payload_size: 5,
            count: None,
            max_misses: None,
            sentinels: SentinelArgs {
                header: 0x21,
                trailer: 0x0A,
                checksum,
            },
        }
    }

    fn stream(prefix: &[u8], frames: &[RawFrame], pad: usize) -> Vec<u8> {
        let mut out = prefix.to_vec();
        for frame in frames {
            out.extend_from_slice(frame.as_bytes());
        }
        out.extend(std::iter::repeat(0u8).take(pad));
        out
    }

    fn frames(checksum: bool) -> Vec<RawFrame> {
        let sentinels = args(checksum).sentinels;
        let payload_len = if checksum { 4 } else { 5 };
        (1u8..=3)
            .map(|k| build_frame(&sentinels, k, &vec![k; payload_len]).unwrap())
            .collect()
    }

    #[test]
    fn recovers_frames_after_garbage_prefix() {
        let expected = frames(false);
        let input = stream(&[0xEE, 0x00, 0x13], &expected, 5);
        let mut seen = Vec::new();
        let summary = scan(&args(false), Cursor::new(input), &mut seen).unwrap();
        assert_eq!(seen, expected);
        assert_eq!(summary.delivered, 3);
        assert_eq!(summary.misses, 1);
    }

    #[test]
    fn count_stops_early() {
        let expected = frames(false);
        let mut scan_args = args(false);
        scan_args.count = Some(2);
        let mut seen = Vec::new();
        let input = Cursor::new(stream(&[], &expected, 0));
        let summary = scan(&scan_args, input, &mut seen).unwrap();
        assert_eq!(seen, expected[..2].to_vec());
        assert_eq!(summary.iterations, 2);
    }

    #[test]
    fn checksum_mode_skips_corrupted_frames() {
        let good = frames(true);
        let mut input = stream(&[], &good, 0);
        // corrupt the body of the second frame; sentinels stay intact
        input[8 + 3] ^= 0x01;
        let mut seen = Vec::new();
        scan(&args(true), Cursor::new(input), &mut seen).unwrap();
        assert_eq!(seen, vec![good[0].clone(), good[2].clone()]);
    }

    #[test]
    fn max_misses_gives_up_on_noise() {
        let mut scan_args = args(false);
        scan_args.max_misses = Some(4);
        let mut seen = Vec::<RawFrame>::new();
        let summary = scan(&scan_args, io::repeat(0x55), &mut seen).unwrap();
        assert!(seen.is_empty());
        assert_eq!(summary.misses, 4);
    }

    #[test]
    fn read_failures_are_reported() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::PermissionDenied.into())
            }
        }
        let mut seen = Vec::<RawFrame>::new();
        let err = scan(&args(false), Broken, &mut seen).unwrap_err();
        assert_eq!(err.code, crate::exit::PERMISSION_DENIED);
    }
}
