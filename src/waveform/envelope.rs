/// Peak magnitudes of a track at coarse time resolution.
///
/// Never empty; "no visualization" is represented by `None` at the call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmplitudeEnvelope(Vec<u16>);

impl AmplitudeEnvelope {
    pub fn new(peaks: Vec<u16>) -> Option<Self> {
        if peaks.is_empty() {
            None
        } else {
            Some(Self(peaks))
        }
    }

    pub fn peaks(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn peak(&self) -> u16 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Resample to `width` columns, taking the maximum of the peaks that fall
    /// into each column. Narrow envelopes repeat values across columns.
    pub fn resample(&self, width: usize) -> Vec<u64> {
        let len = self.0.len();
        (0..width)
            .map(|col| {
                let start = col * len / width;
                let end = ((col + 1) * len / width).clamp(start + 1, len);
                self.0[start..end].iter().copied().max().unwrap_or(0) as u64
            })
            .collect()
    }
}
