// Example usage of the .outb reader: write a packed file, then read it back

use outb_reader::core::constants::DEFAULT_NAME_LENGTH;
use outb_reader::{
    quantize_channel, quantize_time, read, read_header, FileFormat, FileHeader, OutbWriter,
    RawPayload, Result,
};
use tracing::{debug, info, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let path = std::env::temp_dir().join("IEA-15-240-RWT-Monopile_demo.outb");

    // 60 s at 80 Hz, rotor speed oscillating around 7.5 rpm
    let times: Vec<f64> = (0..4800).map(|i| i as f64 * 0.0125).collect();
    let rot_speed: Vec<f64> = times.iter().map(|t| 7.5 + 0.3 * (0.2 * t).sin()).collect();
    let pitch: Vec<f64> = times.iter().map(|t| 10.0 + (0.05 * t).cos()).collect();

    let (time, packed_time) = quantize_time(&times);
    let (rot_scale, rot_offset, rot_packed) = quantize_channel(&rot_speed);
    let (pitch_scale, pitch_offset, pitch_packed) = quantize_channel(&pitch);

    let payload = rot_packed
        .iter()
        .zip(&pitch_packed)
        .flat_map(|(r, p)| [*r, *p])
        .collect();

    let header = FileHeader {
        format: FileFormat::WithTime,
        name_length: DEFAULT_NAME_LENGTH,
        channel_count: 2,
        step_count: times.len(),
        time,
        channel_scale: vec![rot_scale, pitch_scale],
        channel_offset: vec![rot_offset, pitch_offset],
        description: "Predictions were generated by the outb_reader demo".into(),
        channel_names: vec!["Time".into(), "RotSpeed".into(), "BldPitch1".into()],
        channel_units: vec!["s".into(), "rpm".into(), "deg".into()],
    };

    let mut writer = OutbWriter::create(&path)?;
    writer.write(&header, Some(packed_time.as_slice()), &RawPayload::Int16(payload))?;
    drop(writer);
    info!("Wrote {}", path.display());

    let parsed = read_header(&path)?;
    info!(
        "Header: format {:?}, {} channels, {} steps",
        parsed.format, parsed.channel_count, parsed.step_count
    );

    let (table, meta) = read(&path, true)?;
    info!("{}: {}", meta.name, meta.description);
    for (name, unit) in meta.channel_names.iter().zip(&meta.channel_units) {
        info!("  {} [{}]", name, unit);
    }

    // drop the first 10 s transient
    let steady = table.window(10.0, f64::INFINITY);
    let speed = steady.channel(&meta, "RotSpeed")?;
    debug!("{} of {} rows after 10 s", steady.n_rows(), table.n_rows());
    info!(
        "RotSpeed range after 10 s: {:.4} .. {:.4} rpm",
        speed.iter().copied().fold(f64::INFINITY, f64::min),
        speed.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    );

    std::fs::remove_file(&path).ok();
    Ok(())
}
