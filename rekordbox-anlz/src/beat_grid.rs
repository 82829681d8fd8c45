//! Beat grid accessors (PQTZ, PQT2)
//!
//! Beats store their tempo as BPM × 100 and their time in milliseconds.
//! Conversions from floating point round to the nearest stored unit and
//! reject values the field can't hold (negative, NaN, too large).

use crate::error::{Error, Result};
use crate::structs::{Beat, BeatGrid, CompactBeat, ExtendedBeatGrid};

fn bpm_to_tempo(bpm: f64) -> Result<u16> {
    let tempo = (bpm * 100.0).round();
    if !(0.0..=u16::MAX as f64).contains(&tempo) {
        return Err(Error::Value(format!("BPM {} out of range (0 to 655.35)", bpm)));
    }
    Ok(tempo as u16)
}

/// Seconds to the millisecond unit of beat and cue times
pub(crate) fn seconds_to_ms(seconds: f64) -> Result<u32> {
    let time = (seconds * 1000.0).round();
    if !(0.0..=u32::MAX as f64).contains(&time) {
        return Err(Error::Value(format!("Time {}s out of range", seconds)));
    }
    Ok(time as u32)
}

fn convert_all<T>(values: &[f64], convert: fn(f64) -> Result<T>) -> Result<Vec<T>> {
    values.iter().map(|&v| convert(v)).collect()
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::Value(format!(
            "Number of {} not equal to number of entries: {} != {}",
            what, actual, expected
        )));
    }
    Ok(())
}

impl Beat {
    pub fn new(beat: u16, bpm: f64, seconds: f64) -> Result<Self> {
        Ok(Self {
            beat,
            tempo: bpm_to_tempo(bpm)?,
            time: seconds_to_ms(seconds)?,
        })
    }

    pub fn bpm(&self) -> f64 {
        self.tempo as f64 / 100.0
    }

    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        self.tempo = bpm_to_tempo(bpm)?;
        Ok(())
    }

    /// Seconds from track start
    pub fn seconds(&self) -> f64 {
        self.time as f64 / 1000.0
    }

    pub fn set_seconds(&mut self, seconds: f64) -> Result<()> {
        self.time = seconds_to_ms(seconds)?;
        Ok(())
    }
}

impl BeatGrid {
    /// Generate a constant-tempo grid in 4/4, from the first beat until `duration`
    pub fn constant_tempo(bpm: f64, first_beat: f64, duration: f64) -> Result<Self> {
        let mut entries = Vec::new();
        if bpm > 0.0 {
            let beat_duration = 60.0 / bpm;
            let mut time = first_beat;
            let mut beat_in_bar = 1u16;

            while time < duration {
                entries.push(Beat::new(beat_in_bar, bpm, time)?);
                time += beat_duration;
                beat_in_bar = if beat_in_bar == 4 { 1 } else { beat_in_bar + 1 };
            }
        }

        Ok(Self {
            entry_count: entries.len() as u32,
            entries,
            ..Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of every beat within its bar
    pub fn beats(&self) -> Vec<u16> {
        self.entries.iter().map(|b| b.beat).collect()
    }

    pub fn bpms(&self) -> Vec<f64> {
        self.entries.iter().map(Beat::bpm).collect()
    }

    /// Beat times in seconds
    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(Beat::seconds).collect()
    }

    /// Mean BPM over all beats, 0 for an empty grid
    pub fn bpm_average(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.bpms().iter().sum::<f64>() / self.entries.len() as f64
    }

    /// Distinct BPM values, ascending
    pub fn bpms_unique(&self) -> Vec<f64> {
        let mut tempos: Vec<u16> = self.entries.iter().map(|b| b.tempo).collect();
        tempos.sort_unstable();
        tempos.dedup();
        tempos.into_iter().map(|t| t as f64 / 100.0).collect()
    }

    pub fn set_beats(&mut self, beats: &[u16]) -> Result<()> {
        check_len("beats", self.entries.len(), beats.len())?;
        for (entry, &beat) in self.entries.iter_mut().zip(beats) {
            entry.beat = beat;
        }
        Ok(())
    }

    /// Nothing changes when a value is out of range
    pub fn set_bpms(&mut self, bpms: &[f64]) -> Result<()> {
        check_len("BPMs", self.entries.len(), bpms.len())?;
        let tempos = convert_all(bpms, bpm_to_tempo)?;
        for (entry, tempo) in self.entries.iter_mut().zip(tempos) {
            entry.tempo = tempo;
        }
        Ok(())
    }

    pub fn set_times(&mut self, times: &[f64]) -> Result<()> {
        check_len("times", self.entries.len(), times.len())?;
        let times = convert_all(times, seconds_to_ms)?;
        for (entry, time) in self.entries.iter_mut().zip(times) {
            entry.time = time;
        }
        Ok(())
    }

    /// Overwrite beats, BPMs and times at once. Nothing changes on error.
    pub fn set(&mut self, beats: &[u16], bpms: &[f64], times: &[f64]) -> Result<()> {
        let n = self.entries.len();
        check_len("beats", n, beats.len())?;
        check_len("BPMs", n, bpms.len())?;
        check_len("times", n, times.len())?;
        let tempos = convert_all(bpms, bpm_to_tempo)?;
        let times = convert_all(times, seconds_to_ms)?;
        for (((entry, &beat), tempo), time) in
            self.entries.iter_mut().zip(beats).zip(tempos).zip(times)
        {
            *entry = Beat { beat, tempo, time };
        }
        Ok(())
    }
}

impl ExtendedBeatGrid {
    /// Number of compact beat entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Beat numbers of the two tempo anchors
    pub fn beats(&self) -> [u16; 2] {
        self.bpm.map(|b| b.beat)
    }

    pub fn bpms(&self) -> [f64; 2] {
        self.bpm.map(|b| b.bpm())
    }

    pub fn times(&self) -> [f64; 2] {
        self.bpm.map(|b| b.seconds())
    }

    pub fn set_beats(&mut self, beats: &[u16]) -> Result<()> {
        check_len("beats", self.bpm.len(), beats.len())?;
        for (anchor, &beat) in self.bpm.iter_mut().zip(beats) {
            anchor.beat = beat;
        }
        Ok(())
    }

    pub fn set_bpms(&mut self, bpms: &[f64]) -> Result<()> {
        check_len("BPMs", self.bpm.len(), bpms.len())?;
        let tempos = convert_all(bpms, bpm_to_tempo)?;
        for (anchor, tempo) in self.bpm.iter_mut().zip(tempos) {
            anchor.tempo = tempo;
        }
        Ok(())
    }

    pub fn set_times(&mut self, times: &[f64]) -> Result<()> {
        check_len("times", self.bpm.len(), times.len())?;
        let times = convert_all(times, seconds_to_ms)?;
        for (anchor, time) in self.bpm.iter_mut().zip(times) {
            anchor.time = time;
        }
        Ok(())
    }

    /// Beat numbers of the compact grid
    pub fn beat_grid(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.beat).collect()
    }

    /// Replace the compact grid. `entry_count` follows on the next length update.
    pub fn set_beat_grid(&mut self, beats: &[u8]) {
        self.entries = beats
            .iter()
            .map(|&beat| CompactBeat { beat, unknown: 0 })
            .collect();
    }
}
