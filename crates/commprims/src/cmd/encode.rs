use commprims_frame::{checksum, parse_hex, RawFrame};
use tracing::debug;

use crate::cmd::{EncodeArgs, SentinelArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.payload).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("--payload is not valid hex: {:?}", args.payload),
        )
    })?;
    let frame = build_frame(&args.sentinels, args.kind, &payload)?;
    debug!(
        kind = frame.kind(),
        size = frame.len(),
        repeat = args.repeat,
        "encoded frame"
    );

    for index in 0..args.repeat {
        print_frame(index, &frame, format);
    }
    Ok(SUCCESS)
}

/// Frame `payload` under `kind`, appending the checksum byte when requested.
pub fn build_frame(sentinels: &SentinelArgs, kind: u8, payload: &[u8]) -> CliResult<RawFrame> {
    let mut body = payload.to_vec();
    if sentinels.checksum {
        body.push(kind.wrapping_add(checksum(payload)));
    }
    let layout = sentinels.layout(body.len())?;

    let mut bytes = Vec::with_capacity(layout.frame_len());
    bytes.push(layout.header);
    bytes.push(kind);
    bytes.extend_from_slice(&body);
    bytes.push(layout.trailer);
    RawFrame::new(&layout, bytes).map_err(|err| frame_error("encode failed", err))
}
