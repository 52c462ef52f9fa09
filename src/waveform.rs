use ndarray::{Array1, Axis};
use num::complex::Complex64;
use rand::Rng;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::{
    error::{ensure_positive, RdmError, Result},
    helper::tagged_object,
    signal::{Chirp, Rectangle, SampledDomain, Signal},
};

// Every waveform is unit amplitude, compression gain enters through the
// time-bandwidth product of the SNR calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "lowercase")]
pub enum WaveformSpec {
    Uncoded {
        #[serde(alias = "bw")]
        bandwidth: f64,
    },
    Barker {
        #[serde(alias = "bw")]
        bandwidth: f64,
        nchips: usize,
    },
    Random {
        #[serde(alias = "bw")]
        bandwidth: f64,
        nchips: usize,
    },
    Lfm {
        #[serde(alias = "bw")]
        bandwidth: f64,
        #[serde(alias = "T")]
        duration: f64,
        // +1 for an up chirp, -1 for a down chirp
        #[serde(alias = "chirpUpDown")]
        chirp_up_down: i32,
    },
    #[serde(other)]
    Unknown,
}

impl<'de> Deserialize<'de> for WaveformSpec {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        match tagged_object(deserializer)? {
            Some(value) => WaveformSpec::deserialize(value).map_err(D::Error::custom),
            None => Ok(WaveformSpec::Unknown),
        }
    }
}

impl Serialize for WaveformSpec {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        WaveformSpec::serialize(self, serializer)
    }
}

impl WaveformSpec {
    pub fn name(&self) -> &'static str {
        match self {
            WaveformSpec::Uncoded { .. } => "uncoded",
            WaveformSpec::Barker { .. } => "barker",
            WaveformSpec::Random { .. } => "random",
            WaveformSpec::Lfm { .. } => "lfm",
            WaveformSpec::Unknown => "unknown",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            WaveformSpec::Uncoded { bandwidth } => {
                ensure_positive("waveform bandwidth", bandwidth)?;
            }
            WaveformSpec::Barker { bandwidth, nchips } => {
                ensure_positive("waveform bandwidth", bandwidth)?;
                barker_code(nchips)?;
            }
            WaveformSpec::Random { bandwidth, nchips } => {
                ensure_positive("waveform bandwidth", bandwidth)?;
                if nchips == 0 {
                    return Err(RdmError::ZeroChips);
                }
            }
            WaveformSpec::Lfm {
                bandwidth,
                duration,
                chirp_up_down,
            } => {
                ensure_positive("waveform bandwidth", bandwidth)?;
                ensure_positive("LFM pulse duration", duration)?;
                if chirp_up_down == 0 {
                    return Err(RdmError::InvalidChirpDirection);
                }
            }
            WaveformSpec::Unknown => {}
        }
        Ok(())
    }

    /// Samples the pulse at `sample_rate`. Chip signs of a random code are drawn from `rng`.
    ///
    /// An unrecognized waveform degrades to a single unit sample rather than failing.
    pub fn synthesize<R: Rng + ?Sized>(&self, sample_rate: f64, rng: &mut R) -> Result<Waveform> {
        self.validate()?;
        ensure_positive("sample rate", sample_rate)?;

        let waveform = match *self {
            WaveformSpec::Uncoded { bandwidth } => {
                let chip = chip_samples(sample_rate, bandwidth);
                Waveform {
                    samples: chip,
                    bandwidth,
                    time_bandwidth_product: 1.,
                    pulse_width: 1. / bandwidth,
                }
            }
            WaveformSpec::Barker { bandwidth, nchips } => {
                let code = barker_code(nchips)?;
                Waveform {
                    samples: phase_coded(&code, sample_rate, bandwidth),
                    bandwidth,
                    time_bandwidth_product: nchips as f64,
                    pulse_width: nchips as f64 / bandwidth,
                }
            }
            WaveformSpec::Random { bandwidth, nchips } => {
                let code: Vec<f64> = (0..nchips)
                    .map(|_| if rng.gen::<bool>() { 1. } else { -1. })
                    .collect();
                Waveform {
                    samples: phase_coded(&code, sample_rate, bandwidth),
                    bandwidth,
                    time_bandwidth_product: nchips as f64,
                    pulse_width: nchips as f64 / bandwidth,
                }
            }
            WaveformSpec::Lfm {
                bandwidth,
                duration,
                chirp_up_down,
            } => {
                let chirp = Chirp {
                    bandwidth,
                    length: duration,
                    direction: chirp_up_down.signum() as f64,
                };
                let len = ((duration * sample_rate).round() as usize).max(1);
                Waveform {
                    samples: chirp.generate_signal(&SampledDomain::from_sample_count(
                        0.,
                        sample_rate,
                        len,
                    )),
                    bandwidth,
                    time_bandwidth_product: bandwidth * duration,
                    pulse_width: duration,
                }
            }
            WaveformSpec::Unknown => {
                warn!("waveform type not recognized, using a unit impulse");
                Waveform::impulse()
            }
        };

        debug!(
            kind = self.name(),
            samples = waveform.len(),
            bandwidth = waveform.bandwidth,
            time_bandwidth_product = waveform.time_bandwidth_product,
            pulse_width = waveform.pulse_width,
            "synthesized waveform"
        );

        Ok(waveform)
    }
}

/// A sampled transmit pulse and the scalars the rest of the pipeline needs from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Array1<Complex64>,
    pub bandwidth: f64,
    pub time_bandwidth_product: f64,
    // seconds
    pub pulse_width: f64,
}

impl Waveform {
    pub fn impulse() -> Waveform {
        Waveform {
            samples: Array1::from_elem(1, Complex64::new(1., 0.)),
            bandwidth: 1.,
            time_bandwidth_product: 1.,
            pulse_width: 1.,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    // Computes the coefficients of a filter matched to this waveform.
    // The matched filter is given by the conjugated and time reversed
    // transmitted pulse.
    pub fn matched_filter_coefficients(&self) -> Array1<Complex64> {
        let mut sig = self.samples.clone();
        sig.invert_axis(Axis(0));
        sig.mapv_inplace(|x| x.conj());

        sig
    }
}

fn samples_per_chip(sample_rate: f64, bandwidth: f64) -> usize {
    ((sample_rate / bandwidth).round() as usize).max(1)
}

fn chip_samples(sample_rate: f64, bandwidth: f64) -> Array1<Complex64> {
    let len = samples_per_chip(sample_rate, bandwidth);
    Rectangle {
        length: 1. / bandwidth,
    }
    .generate_signal(&SampledDomain::from_sample_count(0., sample_rate, len))
}

// Binary phase code, each chip held for 1/bandwidth.
fn phase_coded(code: &[f64], sample_rate: f64, bandwidth: f64) -> Array1<Complex64> {
    let chip = chip_samples(sample_rate, bandwidth);
    code.iter()
        .flat_map(|&sign| chip.iter().map(move |&x| x * sign))
        .collect()
}

/// Barker code of the given length.
pub fn barker_code(nchips: usize) -> Result<Vec<f64>> {
    let code: &[i8] = match nchips {
        2 => &[1, -1],
        3 => &[1, 1, -1],
        4 => &[1, 1, -1, 1],
        5 => &[1, 1, 1, -1, 1],
        7 => &[1, 1, 1, -1, -1, 1, -1],
        11 => &[1, 1, 1, -1, -1, -1, 1, -1, -1, 1, -1],
        13 => &[1, 1, 1, 1, 1, -1, -1, 1, 1, -1, 1, -1, 1],
        n => return Err(RdmError::UnsupportedBarkerLength(n)),
    };
    Ok(code.iter().map(|&x| x as f64).collect())
}
