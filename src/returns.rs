use std::f64::consts::PI;

use ndarray::Array1;
use num::complex::Complex64;
use rand::Rng;
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::{
    datacube::DataCube,
    geometry::{alias_range, alias_time, first_echo_bin, frequency_doppler, time_axis},
    helper::{nearest_index, tagged_object, wrap_phase},
    radar::{RadarConfig, SPEED_OF_LIGHT},
    target::TargetInfo,
    vbm::{slow_time_sequence, VbmMethod},
    waveform::Waveform,
};

const c: f64 = SPEED_OF_LIGHT;

// A memory return replays the first pulse the repeater receives on every
// later pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "lowercase")]
pub enum ReturnSpec {
    Skin,
    Memory(MemoryReturn),
    #[serde(other)]
    Unknown,
}

impl<'de> Deserialize<'de> for ReturnSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match tagged_object(deserializer)? {
            Some(value) => ReturnSpec::deserialize(value).map_err(D::Error::custom),
            None => Ok(ReturnSpec::Unknown),
        }
    }
}

impl Serialize for ReturnSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReturnSpec::serialize(self, serializer)
    }
}

impl ReturnSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ReturnSpec::Skin => "skin",
            ReturnSpec::Memory(_) => "memory",
            ReturnSpec::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryReturn {
    // Spurious range-rate added to the playback, m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdot_offset: Option<f64>,
    // Half-width of the velocity bin mask, m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdot_delta: Option<f64>,
    pub vbm_method: VbmMethod,
    // Extra round trip delay, s. May be negative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    // Range shift of the playback, m. Takes precedence over `delay`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_offset: Option<f64>,
}

impl MemoryReturn {
    pub fn delay(&self) -> f64 {
        match (self.range_offset, self.delay) {
            (Some(range_offset), _) => 2. * range_offset / c,
            (None, Some(delay)) => delay,
            (None, None) => 0.,
        }
    }
}

/// Everything the injector needs to know about the CPI.
pub struct Injection<'a> {
    pub radar: &'a RadarConfig,
    pub target: &'a TargetInfo,
    pub waveform: &'a Waveform,
    pub snr_volt: f64,
    pub range_axis: &'a Array1<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub pulse: usize,
    pub range_bin: usize,
}

/// Where each echo landed, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InjectionReport {
    pub first_echo_bin: usize,
    pub placements: Vec<Placement>,
    // Per-pulse phase step estimated by a memory return
    pub phase_delta: Option<f64>,
}

impl InjectionReport {
    pub fn range_bin_of(&self, pulse: usize) -> Option<usize> {
        self.placements
            .iter()
            .find(|p| p.pulse == pulse)
            .map(|p| p.range_bin)
    }
}

/// Adds the echo described by `spec` into `cube`.
///
/// Pulses earlier than the first echo bin receive nothing: the first
/// transmitted pulse has not yet returned.
pub fn inject_return<R: Rng + ?Sized>(
    spec: &ReturnSpec,
    ctx: &Injection,
    cube: &mut DataCube,
    rng: &mut R,
) -> InjectionReport {
    let report = match spec {
        ReturnSpec::Skin => inject_skin(ctx, cube),
        ReturnSpec::Memory(memory) => inject_memory(memory, ctx, cube, rng),
        ReturnSpec::Unknown => {
            warn!("return type not recognized, no return added");
            InjectionReport {
                first_echo_bin: first_echo_bin(ctx.target.range, ctx.radar.prf),
                ..Default::default()
            }
        }
    };

    debug!(
        kind = spec.name(),
        first_echo_bin = report.first_echo_bin,
        pulses = report.placements.len(),
        "injected return"
    );

    report
}

fn inject_skin(ctx: &Injection, cube: &mut DataCube) -> InjectionReport {
    let prf = ctx.radar.prf;
    let num_pulses = cube.num_pulses();
    let first = first_echo_bin(ctx.target.range, prf);
    let ranges = ctx.target.range_history(num_pulses, prf);

    // Pulses are timed from their leading edge, not their centre.
    let r_pw_offset = ctx.waveform.pulse_width / 2. * c / 2.;

    let mut report = InjectionReport {
        first_echo_bin: first,
        ..Default::default()
    };

    for i in 0..num_pulses.saturating_sub(first) {
        let phase = -4. * PI * ctx.radar.carrier_freq / c * ranges[i];
        let aliased = alias_range(ranges[i], prf);
        let range_bin = nearest_index(ctx.range_axis, aliased - r_pw_offset).unwrap_or(0);

        let pulse = &ctx.waveform.samples * Complex64::from_polar(ctx.snr_volt, phase);
        cube.add_at_index(i + first, &pulse, range_bin);
        report.placements.push(Placement {
            pulse: i + first,
            range_bin,
        });
    }

    report
}

// Mean of the wrapped sample-by-sample phase difference between two pulses.
fn mean_phase_delta(stored: &Array1<Complex64>, received: &Array1<Complex64>) -> f64 {
    let n = stored.len().max(1) as f64;
    stored
        .iter()
        .zip(received.iter())
        .map(|(a, b)| wrap_phase(b.arg() - a.arg()))
        .sum::<f64>()
        / n
}

fn inject_memory<R: Rng + ?Sized>(
    memory: &MemoryReturn,
    ctx: &Injection,
    cube: &mut DataCube,
    rng: &mut R,
) -> InjectionReport {
    let radar = ctx.radar;
    let (prf, fc) = (radar.prf, radar.carrier_freq);
    let num_pulses = cube.num_pulses();
    let first = first_echo_bin(ctx.target.range, prf);

    let t_pw_offset = ctx.waveform.pulse_width / 2.;
    let t_axis = time_axis(radar.sample_rate, ctx.range_axis.len());
    let one_way_time = ctx.target.range_history(num_pulses, prf) / c;
    let one_way_phase = one_way_time.mapv(|t| -2. * PI * fc * t);

    let f_rdot = memory.rdot_offset.map(|rdot| frequency_doppler(fc, rdot));
    let mask = match memory.rdot_delta {
        Some(rdot_delta) => {
            slow_time_sequence(memory.vbm_method, num_pulses, fc, rdot_delta, prf, rng)
        }
        None => Array1::from_elem(num_pulses, Complex64::new(1., 0.)),
    };
    let delay = memory.delay();

    let mut report = InjectionReport {
        first_echo_bin: first,
        ..Default::default()
    };

    let count = num_pulses.saturating_sub(first);
    if count == 0 {
        return report;
    }

    let received =
        |i: usize| &ctx.waveform.samples * Complex64::from_polar(1., one_way_phase[i]);

    // The first pulse is recorded, not played back.
    let stored = received(0);
    let mut phase_delta = 0.;

    for i in 1..count {
        if i == 1 {
            phase_delta = mean_phase_delta(&stored, &received(1));
            report.phase_delta = Some(phase_delta);
        }

        let mut factor = ctx.snr_volt * mask[i] * Complex64::from_polar(1., i as f64 * phase_delta);
        if let Some(f_rdot) = f_rdot {
            factor *= Complex64::from_polar(1., i as f64 * 2. * PI * f_rdot / prf);
        }
        // Propagation back to the radar.
        factor *= Complex64::from_polar(1., one_way_phase[i + first]);

        let pulse = &stored * factor;

        let arrival = alias_time(2. * one_way_time[i] + delay, prf);
        let range_bin = nearest_index(&t_axis, arrival - t_pw_offset).unwrap_or(0);

        cube.add_at_index(i + first, &pulse, range_bin);
        report.placements.push(Placement {
            pulse: i + first,
            range_bin,
        });
    }

    report
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{inject_return, Injection, InjectionReport, MemoryReturn, ReturnSpec};
    use crate::{
        datacube::DataCube,
        geometry::{num_range_bins, range_axis},
        helper::wrap_phase,
        radar::{test_radar, RadarConfig},
        target::TargetInfo,
        waveform::{Waveform, WaveformSpec},
    };

    const NUM_PULSES: usize = 64;

    fn lfm(radar: &RadarConfig) -> Waveform {
        WaveformSpec::Lfm {
            bandwidth: 10e6,
            duration: 1e-6,
            chirp_up_down: 1,
        }
        .synthesize(radar.sample_rate, &mut ChaCha8Rng::seed_from_u64(0))
        .unwrap()
    }

    fn run(spec: &ReturnSpec, target: &TargetInfo) -> (DataCube, InjectionReport) {
        let radar = test_radar();
        let waveform = lfm(&radar);
        let bins = num_range_bins(radar.sample_rate, radar.prf);
        let axis = range_axis(radar.sample_rate, bins);
        let ctx = Injection {
            radar: &radar,
            target,
            waveform: &waveform,
            snr_volt: 2.,
            range_axis: &axis,
        };
        let mut cube = DataCube::zeros(bins, NUM_PULSES);
        let report = inject_return(spec, &ctx, &mut cube, &mut ChaCha8Rng::seed_from_u64(1));
        (cube, report)
    }

    fn target(range: f64, range_rate: f64) -> TargetInfo {
        TargetInfo {
            range,
            range_rate,
            rcs: 10.,
        }
    }

    #[test]
    fn skin_lands_at_compensated_range_bin() {
        let (cube, report) = run(&ReturnSpec::Skin, &target(3500., 0.));
        assert_eq!(report.first_echo_bin, 4);
        // 3500 m aliases to 500 m; less 75 m of half pulse width is bin 56.67 -> 57.
        assert!(report.placements.iter().all(|p| p.range_bin == 57));
        for pulse in 0..4 {
            assert_eq!(cube.pulse_energy(pulse), 0.);
        }
        for pulse in 4..NUM_PULSES {
            // 20 unit samples scaled by a voltage of 2.
            assert_relative_eq!(cube.pulse_energy(pulse), 80., max_relative = 1e-9);
        }
        assert_eq!(report.placements.len(), NUM_PULSES - 4);
        assert_eq!(report.range_bin_of(4), Some(57));
    }

    #[test]
    fn skin_phase_follows_two_way_range() {
        let tgt = target(3500., 500.);
        let (cube, report) = run(&ReturnSpec::Skin, &tgt);
        // Pulse-to-pulse phase step at the first sample is -4π fc/c Δr.
        let step = -4. * std::f64::consts::PI * 10e9 / 3e8 * 500. / 200e3;
        let bin = report.range_bin_of(10).unwrap();
        assert_eq!(report.range_bin_of(11), Some(bin));
        let a = cube.data()[[bin, 10]];
        let b = cube.data()[[bin, 11]];
        assert_relative_eq!((b * a.conj()).arg(), wrap_phase(step), epsilon = 1e-6);
    }

    #[test]
    fn skin_bin_migrates_with_range_rate() {
        // 75 km/s over 64 pulses at 200 kHz moves 24 m, a little over three bins.
        let (_, report) = run(&ReturnSpec::Skin, &target(1000., 75e3));
        let bins: Vec<usize> = report.placements.iter().map(|p| p.range_bin).collect();
        assert!(bins.windows(2).all(|w| w[1] >= w[0]));
        let excursion = bins[bins.len() - 1] - bins[0];
        assert!((2..=4).contains(&excursion), "{}", excursion);
    }

    #[test]
    fn skin_bin_wraps_at_unambiguous_range() {
        // 0.375 m per pulse from 740 m crosses 750 m between pulses 26 and 27.
        let (cube, report) = run(&ReturnSpec::Skin, &target(740., 75e3));
        assert_eq!(report.first_echo_bin, 0);
        let bins: Vec<usize> = report.placements.iter().map(|p| p.range_bin).collect();
        assert_eq!(bins.len(), NUM_PULSES);

        let (before, after) = bins.split_at(27);
        assert!(before.windows(2).all(|w| w[1] >= w[0]), "{:?}", bins);
        assert!(before[..17].iter().all(|&b| b == 89), "{:?}", bins);
        assert!(before[17..].iter().all(|&b| b == 90), "{:?}", bins);
        // Just past the wrap the compensated range is negative and clamps to bin 0.
        assert!(after.iter().all(|&b| b == 0), "{:?}", bins);

        // Echoes near the end of the PRI are cut off at the last range bin.
        assert_relative_eq!(cube.pulse_energy(0), 11. * 4., max_relative = 1e-9);
        assert_relative_eq!(cube.pulse_energy(26), 10. * 4., max_relative = 1e-9);
        assert_relative_eq!(cube.pulse_energy(27), 20. * 4., max_relative = 1e-9);
    }

    #[test]
    fn echo_beyond_cpi_is_dropped() {
        // First echo arrives after the last pulse of the CPI.
        let (cube, report) = run(&ReturnSpec::Skin, &target(750. * 70., 0.));
        assert_eq!(report.first_echo_bin, 70);
        assert!(report.placements.is_empty());
        assert!(cube.data().iter().all(|x| x.norm() == 0.));
    }

    #[test]
    fn memory_records_first_pulse_and_estimates_doppler() {
        let tgt = target(3500., 500.);
        let (cube, report) = run(&ReturnSpec::Memory(MemoryReturn::default()), &tgt);
        // Pulse 4 is recorded only.
        assert_eq!(cube.pulse_energy(4), 0.);
        assert_eq!(report.placements.first().map(|p| p.pulse), Some(5));
        assert_eq!(report.placements.len(), NUM_PULSES - 5);

        let expected = wrap_phase(-2. * std::f64::consts::PI * 10e9 * 500. / (3e8 * 200e3));
        assert_relative_eq!(report.phase_delta.unwrap(), expected, epsilon = 1e-6);

        // Same arrival bin as the skin return when there is no delay.
        let (_, skin) = run(&ReturnSpec::Skin, &tgt);
        assert_eq!(report.range_bin_of(10), skin.range_bin_of(10));
    }

    #[test]
    fn memory_range_offset_moves_return() {
        let tgt = target(3500., 0.);
        let spec = ReturnSpec::Memory(MemoryReturn {
            range_offset: Some(150.),
            delay: Some(1.),
            ..Default::default()
        });
        let (_, shifted) = run(&spec, &tgt);
        let (_, plain) = run(&ReturnSpec::Memory(MemoryReturn::default()), &tgt);
        // 150 m is 20 bins of 7.5 m; the explicit delay is overridden.
        assert_eq!(
            shifted.range_bin_of(10).unwrap(),
            plain.range_bin_of(10).unwrap() + 20
        );
    }

    #[test]
    fn memory_delay_without_range_offset() {
        let spec = MemoryReturn {
            delay: Some(1e-6),
            ..Default::default()
        };
        assert_relative_eq!(spec.delay(), 1e-6);
        assert_relative_eq!(MemoryReturn::default().delay(), 0.);
    }

    #[test]
    fn unknown_return_adds_nothing() {
        let spec: ReturnSpec = serde_json::from_str(r#"{"type": "chaff"}"#).unwrap();
        assert_eq!(spec, ReturnSpec::Unknown);
        let (cube, report) = run(&spec, &target(3500., 0.));
        assert!(report.placements.is_empty());
        assert!(cube.data().iter().all(|x| x.norm() == 0.));
    }

    #[test]
    fn memory_return_from_legacy_keys() {
        let spec: ReturnSpec = serde_json::from_str(
            r#"{"type": "memory", "rdot_delta": 500, "rdot_offset": 100, "range_offset": 0}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            ReturnSpec::Memory(MemoryReturn {
                rdot_offset: Some(100.),
                rdot_delta: Some(500.),
                range_offset: Some(0.),
                ..Default::default()
            })
        );
        let skin: ReturnSpec = serde_json::from_str(r#"{"type": "skin"}"#).unwrap();
        assert_eq!(skin, ReturnSpec::Skin);
    }

    #[test]
    fn missing_or_null_type_is_unknown() {
        for json in [r#"{"type": null}"#, r#"{}"#, r#"{"rdot_delta": 500}"#] {
            let spec: ReturnSpec = serde_json::from_str(json).unwrap();
            assert_eq!(spec, ReturnSpec::Unknown, "{}", json);
        }
        assert!(serde_json::from_str::<ReturnSpec>("[]").is_err());

        let memory = ReturnSpec::Memory(MemoryReturn {
            rdot_delta: Some(500.),
            ..Default::default()
        });
        let json = serde_json::to_string(&memory).unwrap();
        assert!(json.contains(r#""type":"memory""#), "{}", json);
        assert_eq!(serde_json::from_str::<ReturnSpec>(&json).unwrap(), memory);
    }
}
