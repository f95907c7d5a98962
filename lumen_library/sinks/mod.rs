//! Frame sinks
//!
//! A [`FrameSink`] receives one [`SimFrame`] per simulation tick. Drawing is
//! out of scope for this workspace; the shipped sinks log frames and record
//! trajectories.

use crate::messages::SimFrame;
use lumen_core::LumenError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("frame has {got} readings, sink was opened for {expected}")]
    ReadingCount { expected: usize, got: usize },
}

impl From<SinkError> for LumenError {
    fn from(err: SinkError) -> Self {
        LumenError::Sink(err.to_string())
    }
}

/// Consumer of per-tick frames
pub trait FrameSink: Send {
    fn present(&mut self, frame: &SimFrame) -> Result<(), SinkError>;

    /// Called once after the last frame
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &SimFrame) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Logs every `every`-th frame at `info` and the rest at `trace`
#[derive(Debug)]
pub struct LogSink {
    every: u64,
}

impl LogSink {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl FrameSink for LogSink {
    fn present(&mut self, frame: &SimFrame) -> Result<(), SinkError> {
        if frame.tick % self.every == 0 {
            tracing::info!(
                tick = frame.tick,
                time = format_args!("{:.2}", frame.time),
                x = format_args!("{:.3}", frame.pose.x),
                y = format_args!("{:.3}", frame.pose.y),
                theta = format_args!("{:.3}", frame.pose.theta),
                steering = format_args!("{:.2}", frame.steering),
                mode = %frame.mode,
                "frame"
            );
        } else {
            tracing::trace!(tick = frame.tick, readings = ?frame.readings, "frame");
        }
        Ok(())
    }
}

/// Writes `tick,time,x,y,theta,velocity,steering,mode,s0..sN` rows
pub struct CsvTrajectorySink<W: Write + Send> {
    writer: csv::Writer<W>,
    sensor_count: usize,
}

impl CsvTrajectorySink<File> {
    pub fn create(path: impl AsRef<Path>, sensor_count: usize) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Self::from_writer(file, sensor_count)
    }
}

impl<W: Write + Send> CsvTrajectorySink<W> {
    /// Wrap `writer` and emit the header row
    pub fn from_writer(writer: W, sensor_count: usize) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header: Vec<String> = ["tick", "time", "x", "y", "theta", "velocity", "steering", "mode"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend((0..sensor_count).map(|i| format!("s{}", i)));
        writer.write_record(&header)?;

        Ok(Self { writer, sensor_count })
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write + Send> FrameSink for CsvTrajectorySink<W> {
    fn present(&mut self, frame: &SimFrame) -> Result<(), SinkError> {
        if frame.readings.len() != self.sensor_count {
            return Err(SinkError::ReadingCount {
                expected: self.sensor_count,
                got: frame.readings.len(),
            });
        }

        let mut record = vec![
            frame.tick.to_string(),
            format!("{:.6}", frame.time),
            format!("{:.6}", frame.pose.x),
            format!("{:.6}", frame.pose.y),
            format!("{:.6}", frame.pose.theta),
            format!("{:.6}", frame.velocity),
            format!("{:.6}", frame.steering),
            frame.mode.to_string(),
        ];
        record.extend(frame.readings.iter().map(|r| format!("{:.6}", r)));
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards each frame to every inner sink in order; stops at the first error
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FrameSink for FanOutSink {
    fn present(&mut self, frame: &SimFrame) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.present(frame)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{DriveMode, Pose2D};
    use std::sync::{Arc, Mutex};

    fn frame(tick: u64, readings: Vec<f64>) -> SimFrame {
        SimFrame {
            tick,
            time: tick as f64 * 0.5,
            pose: Pose2D::new(1.0, 2.0, 0.25),
            sensor_positions: vec![[0.0, 0.0]; readings.len()],
            readings,
            velocity: 1.0,
            steering: -3.0,
            mode: DriveMode::Auto,
        }
    }

    struct Counting(Arc<Mutex<u32>>);

    impl FrameSink for Counting {
        fn present(&mut self, _frame: &SimFrame) -> Result<(), SinkError> {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut sink = CsvTrajectorySink::from_writer(Vec::new(), 2).unwrap();
        sink.present(&frame(1, vec![0.5, 1.0])).unwrap();
        sink.present(&frame(2, vec![0.0, 0.25])).unwrap();

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "tick,time,x,y,theta,velocity,steering,mode,s0,s1");
        assert_eq!(
            lines[1],
            "1,0.500000,1.000000,2.000000,0.250000,1.000000,-3.000000,AUTO,0.500000,1.000000"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_rejects_wrong_reading_count() {
        let mut sink = CsvTrajectorySink::from_writer(Vec::new(), 3).unwrap();
        let err = sink.present(&frame(1, vec![0.5])).unwrap_err();
        assert!(matches!(err, SinkError::ReadingCount { expected: 3, got: 1 }));
    }

    #[test]
    fn test_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");

        let mut sink = CsvTrajectorySink::create(&path, 1).unwrap();
        for tick in 1..=5 {
            sink.present(&frame(tick, vec![0.1])).unwrap();
        }
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let a = Arc::new(Mutex::new(0));
        let b = Arc::new(Mutex::new(0));
        let mut sink = FanOutSink::new()
            .with(Box::new(Counting(a.clone())))
            .with(Box::new(LogSink::new(2)))
            .with(Box::new(Counting(b.clone())));

        for tick in 1..=4 {
            sink.present(&frame(tick, vec![])).unwrap();
        }
        assert_eq!(*a.lock().unwrap(), 4);
        assert_eq!(*b.lock().unwrap(), 4);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_sink_error_converts() {
        let err: LumenError = SinkError::ReadingCount { expected: 1, got: 0 }.into();
        assert!(matches!(err, LumenError::Sink(_)));
    }
}
