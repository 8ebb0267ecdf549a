use std::thread;
use std::time::Duration;

use commprims_exchange::TripleSlotExchange;
use tracing::{debug, warn};

use crate::cmd::ExchangeArgs;
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_exchange, ExchangeReport, OutputFormat};

pub fn run(args: ExchangeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.samples == 0 {
        return Err(CliError::new(USAGE, "--samples must be greater than zero"));
    }
    let report = exercise(args.count, args.samples, Duration::from_micros(args.interval_us))?;
    print_exchange(&report, format);

    if !report.monotonic {
        warn!("consumer observed values out of order");
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

/// Push `0..count` from a producer thread while this thread samples.
///
/// After the producer finishes, one more pop reports whatever it left unread.
fn exercise(count: u32, samples: usize, interval: Duration) -> CliResult<ExchangeReport> {
    let (mut publisher, mut sampler) = TripleSlotExchange::<u32>::new().split();

    let producer = thread::spawn(move || {
        for value in 0..count {
            publisher.push(value);
        }
    });

    let mut seen = Vec::with_capacity(samples);
    for _ in 0..samples {
        seen.push(sampler.pop());
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    producer
        .join()
        .map_err(|_| CliError::new(INTERNAL, "producer thread panicked"))?;
    let last = sampler.pop();
    debug!(?last, "producer finished");

    let mut observed: Vec<u32> = seen.iter().flatten().copied().collect();
    observed.extend(last);
    let monotonic = observed.windows(2).all(|pair| pair[0] < pair[1])
        && observed.iter().all(|value| *value < count);

    Ok(ExchangeReport {
        pushed: count,
        samples: seen,
        last,
        monotonic,
    })
}
