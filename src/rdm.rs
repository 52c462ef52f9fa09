use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::{
    datacube::{DataCube, Fill},
    error::{RdmError, Result},
    geometry::{num_pulses_for_dwell, range_axis, range_rate_from_doppler},
    helper::{decibels, voltage_decibels},
    radar::RadarConfig,
    range_equation::{RangeEquation, SnrCalibration},
    returns::{inject_return, Injection, InjectionReport, MemoryReturn, ReturnSpec},
    signal::fir::Taper,
    target::TargetInfo,
    waveform::WaveformSpec,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessingOptions {
    // Slow-time window applied before the Doppler FFT
    pub taper: Taper,
    // Keep copies of the signal cube before and after the matched filter
    #[serde(alias = "plotSteps")]
    pub record_steps: bool,
}

/// Everything needed to simulate one CPI, as read from a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(alias = "tgtInfo", alias = "tgt")]
    pub target: TargetInfo,
    pub radar: RadarConfig,
    #[serde(alias = "wvf")]
    pub waveform: WaveformSpec,
    // One return object or a list of them
    #[serde(
        alias = "returnInfo",
        alias = "return_list",
        deserialize_with = "one_or_many"
    )]
    pub returns: Vec<ReturnSpec>,
    #[serde(default, alias = "Npulses", skip_serializing_if = "Option::is_none")]
    pub num_pulses: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub options: ProcessingOptions,
}

fn one_or_many<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<ReturnSpec>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ReturnSpec>),
        One(ReturnSpec),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![spec],
    })
}

impl Scenario {
    /// X-band LFM radar looking at a closing 10 m² target at 3.5 km.
    pub fn skin_example() -> Scenario {
        let bw = 10e6;
        Scenario {
            target: TargetInfo {
                range: 3.5e3,
                range_rate: 0.5e3,
                rcs: 10.,
            },
            radar: RadarConfig {
                carrier_freq: 10e9,
                tx_power: 1e3,
                tx_gain: 10f64.powf(30. / 10.),
                rx_gain: 10f64.powf(30. / 10.),
                op_temp: 290.,
                sample_rate: 2. * bw,
                noise_figure: 10f64.powf(8. / 10.),
                total_losses: 10f64.powf(8. / 10.),
                prf: 200e3,
                dwell_time: Some(2e-3),
            },
            waveform: WaveformSpec::Lfm {
                bandwidth: bw,
                duration: 1e-6,
                chirp_up_down: 1,
            },
            returns: vec![ReturnSpec::Skin],
            num_pulses: None,
            seed: Some(0),
            options: ProcessingOptions::default(),
        }
    }

    /// The same engagement seen through a repeater playing back a masked,
    /// Doppler-shifted copy of the first pulse it hears.
    pub fn memory_example() -> Scenario {
        let skin = Scenario::skin_example();
        Scenario {
            waveform: WaveformSpec::Lfm {
                bandwidth: 10e6,
                duration: 10. / 40e6,
                chirp_up_down: 1,
            },
            returns: vec![ReturnSpec::Memory(MemoryReturn {
                rdot_delta: Some(0.5e3),
                rdot_offset: Some(0.1e3),
                range_offset: Some(0.),
                ..Default::default()
            })],
            ..skin
        }
    }

    /// Explicit pulse count, or enough pulses to fill the radar's dwell time.
    pub fn resolved_num_pulses(&self) -> Result<usize> {
        self.target.validate()?;
        self.radar.validate()?;

        let num_pulses = match (self.num_pulses, self.radar.dwell_time) {
            (Some(n), _) => n,
            (None, Some(dwell)) => num_pulses_for_dwell(dwell, self.radar.prf),
            _ => 0,
        };
        if num_pulses == 0 {
            return Err(RdmError::ZeroPulses);
        }
        Ok(num_pulses)
    }

    pub fn run(&self) -> Result<RangeDopplerMap> {
        simulate(
            &self.target,
            &self.radar,
            &self.waveform,
            self.resolved_num_pulses()?,
            &self.returns,
            self.seed,
            &self.options,
        )
    }
}

/// Advisory numbers logged while the map is generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub seed: Option<u64>,
    pub num_pulses: usize,
    pub num_range_bins: usize,
    pub snr_single_pulse: f64,
    pub snr_single_pulse_db: f64,
    pub snr_volt: f64,
    pub snr_expected: f64,
    pub snr_expected_db: f64,
    // Variance of the slow-time spectrum of the raw noise cube, ~num_pulses
    pub noise_spectrum_variance: f64,
    // Statistics of the per-range-bin variance of the processed total cube
    pub noise_variance_mean: f64,
    pub noise_variance_var: f64,
    pub noise_variance_mean_db: f64,
    pub noise_variance_var_db: f64,
    pub peak_signal_db: f64,
    pub peak_noise_db: f64,
    pub peak_total_db: f64,
}

/// Signal cube snapshots taken before Doppler processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Steps {
    pub injected: DataCube,
    pub matched_filtered: DataCube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeKind {
    #[default]
    Total,
    Signal,
    Noise,
    // Signal cube snapshots, only present when steps are recorded
    Injected,
    MatchedFiltered,
}

impl CubeKind {
    pub fn is_doppler_processed(self) -> bool {
        matches!(self, CubeKind::Total | CubeKind::Signal | CubeKind::Noise)
    }
}

/// Strongest cell of a map.
///
/// For the pre-Doppler snapshots `doppler_bin` is the pulse index and there
/// is no range-rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapPeak {
    pub range_bin: usize,
    pub doppler_bin: usize,
    pub range: f64,
    pub range_rate: Option<f64>,
    pub magnitude_db: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeDopplerMap {
    pub range_rate_axis: Array1<f64>,
    pub range_axis: Array1<f64>,
    pub total: DataCube,
    pub signal: DataCube,
    pub noise: DataCube,
    pub diagnostics: Diagnostics,
    pub injections: Vec<InjectionReport>,
    pub steps: Option<Steps>,
}

impl RangeDopplerMap {
    pub fn cube(&self, kind: CubeKind) -> Option<&DataCube> {
        match kind {
            CubeKind::Total => Some(&self.total),
            CubeKind::Signal => Some(&self.signal),
            CubeKind::Noise => Some(&self.noise),
            CubeKind::Injected => self.steps.as_ref().map(|steps| &steps.injected),
            CubeKind::MatchedFiltered => self.steps.as_ref().map(|steps| &steps.matched_filtered),
        }
    }

    pub fn peak(&self, kind: CubeKind) -> Option<MapPeak> {
        let peak = self.cube(kind)?.peak()?;
        Some(MapPeak {
            range_bin: peak.range_bin,
            doppler_bin: peak.pulse,
            range: self.range_axis[peak.range_bin],
            range_rate: kind
                .is_doppler_processed()
                .then(|| self.range_rate_axis[peak.pulse]),
            magnitude_db: voltage_decibels(peak.magnitude),
        })
    }
}

/// Generates the range-Doppler maps of one CPI with a single return.
///
/// With `seed` set the output is bit-for-bit reproducible; otherwise the
/// random source is seeded from the operating system.
pub fn generate_rdm(
    target: &TargetInfo,
    radar: &RadarConfig,
    waveform: &WaveformSpec,
    num_pulses: usize,
    return_spec: &ReturnSpec,
    seed: Option<u64>,
) -> Result<RangeDopplerMap> {
    simulate(
        target,
        radar,
        waveform,
        num_pulses,
        std::slice::from_ref(return_spec),
        seed,
        &ProcessingOptions::default(),
    )
}

/// Range-rate of each Doppler bin.
///
/// The frequency axis comes out of the Doppler stage spaced by the fast-time
/// sample rate; the `prf / sample_rate` factor puts it back on the slow-time
/// grid.
pub fn range_rate_axis(frequencies: &Array1<f64>, radar: &RadarConfig) -> Array1<f64> {
    frequencies.mapv(|f| {
        range_rate_from_doppler(radar.carrier_freq, f * radar.prf / radar.sample_rate)
    })
}

fn validate(
    target: &TargetInfo,
    radar: &RadarConfig,
    waveform: &WaveformSpec,
    num_pulses: usize,
) -> Result<()> {
    target.validate()?;
    radar.validate()?;
    waveform.validate()?;
    if num_pulses == 0 {
        return Err(RdmError::ZeroPulses);
    }
    Ok(())
}

pub fn simulate(
    target: &TargetInfo,
    radar: &RadarConfig,
    waveform: &WaveformSpec,
    num_pulses: usize,
    returns: &[ReturnSpec],
    seed: Option<u64>,
    options: &ProcessingOptions,
) -> Result<RangeDopplerMap> {
    validate(target, radar, waveform, num_pulses)?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    debug!(?seed, num_pulses, "starting CPI");

    let fs = radar.sample_rate;
    let wvf = waveform.synthesize(fs, &mut rng)?;

    let mut signal = DataCube::create(fs, radar.prf, num_pulses, Fill::Zeros, &mut rng)?;
    let num_range_bins = signal.num_range_bins();
    let r_axis = range_axis(fs, num_range_bins);
    debug!(num_range_bins, num_pulses, "allocated datacube");

    let calibration = SnrCalibration::new(
        &RangeEquation::new(radar, target.rcs, wvf.bandwidth),
        target.range,
        num_pulses,
        wvf.time_bandwidth_product,
    );

    let ctx = Injection {
        radar,
        target,
        waveform: &wvf,
        snr_volt: calibration.snr_volt,
        range_axis: &r_axis,
    };
    let injections: Vec<InjectionReport> = returns
        .iter()
        .map(|spec| inject_return(spec, &ctx, &mut signal, &mut rng))
        .collect();

    let mut noise = DataCube::create(fs, radar.prf, num_pulses, Fill::Noise(1.), &mut rng)?;
    let noise_spectrum_variance = {
        let mut spectrum = noise.clone();
        spectrum.doppler_process(fs);
        spectrum.variance()
    };
    info!(noise_spectrum_variance, "raw noise check");
    let mut total = signal.try_add(&noise)?;
    let injected = options.record_steps.then(|| signal.clone());

    for cube in [&mut signal, &mut noise, &mut total] {
        cube.apply_matched_filter(&wvf);
    }
    debug!(taps = wvf.len(), "matched filter applied");
    let steps = injected.map(|injected| Steps {
        injected,
        matched_filtered: signal.clone(),
    });

    let taper = options.taper.coefficients(num_pulses);
    for cube in [&mut signal, &mut noise, &mut total] {
        cube.apply_slow_time_taper(&taper)?;
    }

    let frequencies = signal.doppler_process(fs);
    noise.doppler_process(fs);
    total.doppler_process(fs);
    let rdot_axis = range_rate_axis(&frequencies, radar);
    debug!("doppler processed");

    let diagnostics = diagnose(
        seed,
        &calibration,
        noise_spectrum_variance,
        [&signal, &noise, &total],
    );

    Ok(RangeDopplerMap {
        range_rate_axis: rdot_axis,
        range_axis: r_axis,
        total,
        signal,
        noise,
        diagnostics,
        injections,
        steps,
    })
}

fn peak_db(cube: &DataCube) -> f64 {
    cube.peak()
        .map_or(f64::NEG_INFINITY, |peak| voltage_decibels(peak.magnitude))
}

fn mean_and_variance(values: &Array1<f64>) -> (f64, f64) {
    let n = values.len().max(1) as f64;
    let mean = values.sum() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

fn diagnose(
    seed: Option<u64>,
    calibration: &SnrCalibration,
    noise_spectrum_variance: f64,
    [signal, noise, total]: [&DataCube; 3],
) -> Diagnostics {
    let noise_var = total.range_bin_variance();
    let (noise_variance_mean, noise_variance_var) = mean_and_variance(&noise_var);
    let (noise_variance_mean_db, noise_variance_var_db) =
        mean_and_variance(&noise_var.mapv(voltage_decibels));

    let (num_range_bins, num_pulses) = total.shape();
    let diagnostics = Diagnostics {
        seed,
        num_pulses,
        num_range_bins,
        snr_single_pulse: calibration.snr_single_pulse,
        snr_single_pulse_db: decibels(calibration.snr_single_pulse),
        snr_volt: calibration.snr_volt,
        snr_expected: calibration.snr_expected,
        snr_expected_db: decibels(calibration.snr_expected),
        noise_spectrum_variance,
        noise_variance_mean,
        noise_variance_var,
        noise_variance_mean_db,
        noise_variance_var_db,
        peak_signal_db: peak_db(signal),
        peak_noise_db: peak_db(noise),
        peak_total_db: peak_db(total),
    };

    info!(
        mean = diagnostics.noise_variance_mean,
        var = diagnostics.noise_variance_var,
        mean_db = diagnostics.noise_variance_mean_db,
        var_db = diagnostics.noise_variance_var_db,
        "noise check"
    );
    info!(
        signal_db = diagnostics.peak_signal_db,
        noise_db = diagnostics.peak_noise_db,
        total_db = diagnostics.peak_total_db,
        "SNR test"
    );

    diagnostics
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::{generate_rdm, CubeKind, MemoryReturn, ReturnSpec, Scenario, WaveformSpec};
    use crate::{error::RdmError, signal::fir::Taper};

    fn skin() -> Scenario {
        Scenario::skin_example()
    }

    #[test]
    fn example_shapes_and_axes() {
        let scenario = skin();
        assert_eq!(scenario.resolved_num_pulses(), Ok(400));
        let rdm = scenario.run().unwrap();
        for kind in [CubeKind::Total, CubeKind::Signal, CubeKind::Noise] {
            assert_eq!(rdm.cube(kind).unwrap().shape(), (100, 400));
        }
        assert_eq!(rdm.range_axis.len(), 100);
        assert_relative_eq!(rdm.range_axis[1], 7.5);
        assert_eq!(rdm.range_rate_axis.len(), 400);

        // Zero Doppler sits at n/2 and range-rate falls with frequency.
        assert_relative_eq!(rdm.range_rate_axis[200], 0.);
        assert!(rdm.range_rate_axis.windows(2).into_iter().all(|w| w[1] < w[0]));
        assert_relative_eq!(
            rdm.range_rate_axis[0] - rdm.range_rate_axis[1],
            7.5,
            max_relative = 1e-9
        );
    }

    #[test]
    fn example_peak_at_target() {
        let rdm = skin().run().unwrap();
        let peak = rdm.peak(CubeKind::Signal).unwrap();
        // 3500 m aliases to 500 m in a 750 m PRI.
        assert!((peak.range - 500.).abs() <= 7.5, "{:?}", peak);
        assert!((peak.range_rate.unwrap() - 500.).abs() <= 7.5, "{:?}", peak);

        // Expected SNR is coherent over every pulse.
        let diag = &rdm.diagnostics;
        assert_relative_eq!(diag.snr_expected, 400. * diag.snr_single_pulse, max_relative = 1e-12);
        assert!(diag.peak_total_db > diag.peak_noise_db);
    }

    #[test]
    fn no_signal_before_first_echo() {
        let mut scenario = skin();
        scenario.options.record_steps = true;
        let rdm = scenario.run().unwrap();
        assert_eq!(rdm.injections[0].first_echo_bin, 4);
        let steps = rdm.steps.unwrap();
        for pulse in 0..400 {
            let energy = steps.injected.pulse_energy(pulse);
            if pulse < 4 {
                assert_eq!(energy, 0.);
            } else {
                assert!(energy > 0.);
            }
        }
        // The matched filter does not leak across pulses.
        assert_eq!(steps.matched_filtered.pulse_energy(3), 0.);
        assert!(steps.matched_filtered.pulse_energy(4) > 0.);
    }

    #[test]
    fn recorded_steps_are_selectable_cubes() {
        let rdm = skin().run().unwrap();
        assert!(rdm.cube(CubeKind::Injected).is_none());
        assert!(rdm.peak(CubeKind::MatchedFiltered).is_none());

        let mut scenario = skin();
        scenario.options.record_steps = true;
        let rdm = scenario.run().unwrap();
        for kind in [CubeKind::Injected, CubeKind::MatchedFiltered] {
            assert_eq!(rdm.cube(kind).unwrap().shape(), (100, 400));
            let peak = rdm.peak(kind).unwrap();
            assert_eq!(peak.range_rate, None);
            // Anywhere along the uncompressed pulse, bins 57 to 76.
            assert!((peak.range - 500.).abs() <= 75., "{:?}", peak);
        }
        // Before Doppler processing the peak sits in a single pulse.
        assert!(rdm.peak(CubeKind::MatchedFiltered).unwrap().magnitude_db
            < rdm.peak(CubeKind::Signal).unwrap().magnitude_db);
        assert_eq!(
            serde_json::to_string(&CubeKind::MatchedFiltered).unwrap(),
            r#""matched_filtered""#
        );
    }

    #[test]
    fn raw_noise_spectrum_variance_scales_with_pulses() {
        let rdm = skin().run().unwrap();
        let diag = &rdm.diagnostics;
        assert_relative_eq!(diag.noise_spectrum_variance, 400., max_relative = 0.05);
        assert!(diag.noise_variance_var_db.is_finite());
        assert!(diag.noise_variance_var_db > 0.);
    }

    #[test]
    fn constant_range_without_range_rate() {
        let mut scenario = skin();
        scenario.target.range_rate = 0.;
        let rdm = scenario.run().unwrap();
        let placements = &rdm.injections[0].placements;
        assert!(placements.iter().all(|p| p.range_bin == placements[0].range_bin));
        let peak = rdm.peak(CubeKind::Signal).unwrap();
        assert_eq!(peak.doppler_bin, 200);
    }

    #[test]
    fn same_seed_same_maps() {
        let a = skin().run().unwrap();
        let b = skin().run().unwrap();
        assert_eq!(a.total, b.total);
        assert_eq!(a.noise, b.noise);

        let mut other = skin();
        other.seed = Some(1);
        let c = other.run().unwrap();
        assert_ne!(a.noise, c.noise);
        // The skin return has no random component.
        assert_eq!(a.signal, c.signal);

        let mut unseeded = skin();
        unseeded.seed = None;
        assert_eq!(unseeded.run().unwrap().total.shape(), (100, 400));
    }

    #[test]
    fn total_is_signal_plus_noise_after_processing() {
        let rdm = Scenario::memory_example().run().unwrap();
        let scale = rdm.total.magnitude().fold(0., |a: f64, &b| a.max(b));
        let sum = rdm.signal.try_add(&rdm.noise).unwrap();
        for (x, y) in rdm.total.data().iter().zip(sum.data().iter()) {
            assert!((x - y).norm() <= 1e-9 * scale);
        }
    }

    #[test]
    fn memory_return_is_shifted_by_rdot_offset() {
        let mut scenario = skin();
        scenario.returns = vec![ReturnSpec::Memory(MemoryReturn {
            rdot_offset: Some(100.),
            ..Default::default()
        })];
        let rdm = scenario.run().unwrap();
        let report = &rdm.injections[0];
        assert_eq!(report.placements.first().map(|p| p.pulse), Some(5));
        let peak = rdm.peak(CubeKind::Signal).unwrap();
        assert!((peak.range - 500.).abs() <= 7.5, "{:?}", peak);
        assert!((peak.range_rate.unwrap() - 600.).abs() <= 7.5, "{:?}", peak);
    }

    #[test]
    fn masked_memory_return_is_spread() {
        let masked = Scenario::memory_example().run().unwrap();
        let mut scenario = Scenario::memory_example();
        scenario.returns = vec![ReturnSpec::Memory(MemoryReturn {
            rdot_offset: Some(100.),
            ..Default::default()
        })];
        let unmasked = scenario.run().unwrap();
        assert!(masked.diagnostics.peak_signal_db < unmasked.diagnostics.peak_signal_db - 6.);
    }

    #[test]
    fn several_returns_accumulate() {
        let mut scenario = skin();
        scenario.returns = vec![ReturnSpec::Skin, ReturnSpec::Skin];
        let double = scenario.run().unwrap();
        let single = skin().run().unwrap();
        assert_eq!(double.injections.len(), 2);
        let a = double.peak(CubeKind::Signal).unwrap();
        let b = single.peak(CubeKind::Signal).unwrap();
        assert_relative_eq!(a.magnitude_db - b.magnitude_db, 20. * 2f64.log10(), epsilon = 1e-9);
    }

    #[test]
    fn unknown_return_leaves_noise_only() {
        let scenario = skin();
        let rdm = generate_rdm(
            &scenario.target,
            &scenario.radar,
            &scenario.waveform,
            64,
            &ReturnSpec::Unknown,
            Some(3),
        )
        .unwrap();
        assert!(rdm.signal.data().iter().all(|x| x.norm() == 0.));
        assert_eq!(rdm.total, rdm.noise);
    }

    #[test]
    fn configuration_errors_come_first() {
        let scenario = skin();
        let run = |num_pulses| {
            generate_rdm(
                &scenario.target,
                &scenario.radar,
                &scenario.waveform,
                num_pulses,
                &ReturnSpec::Skin,
                Some(0),
            )
        };
        assert_eq!(run(0).unwrap_err(), RdmError::ZeroPulses);

        let mut bad = skin();
        bad.radar.prf = 0.;
        assert!(matches!(
            bad.resolved_num_pulses(),
            Err(RdmError::InvalidParameter { name: "PRF", .. })
        ));
        assert!(matches!(
            bad.run(),
            Err(RdmError::InvalidParameter { name: "PRF", .. })
        ));
        bad.radar.dwell_time = None;
        assert!(matches!(
            bad.run(),
            Err(RdmError::InvalidParameter { name: "PRF", .. })
        ));

        let mut bad = skin();
        bad.target.rcs = -1.;
        bad.num_pulses = None;
        bad.radar.dwell_time = None;
        assert!(matches!(bad.run(), Err(RdmError::InvalidParameter { .. })));

        let mut bad = skin();
        bad.radar.total_losses = 0.5;
        assert_eq!(bad.run().unwrap_err(), RdmError::LossesBelowUnity(0.5));

        let mut bad = skin();
        bad.num_pulses = None;
        bad.radar.dwell_time = None;
        assert_eq!(bad.run().unwrap_err(), RdmError::ZeroPulses);
    }

    #[test]
    fn unknown_waveform_still_runs() {
        let mut scenario = skin();
        scenario.waveform = serde_json::from_str(r#"{"type": "frank"}"#).unwrap();
        scenario.num_pulses = Some(32);
        let rdm = scenario.run().unwrap();
        assert_eq!(rdm.total.shape(), (100, 32));
    }

    #[test]
    fn untyped_entries_fall_back_to_unknown() {
        let json = include_str!("../scenarios/skin.json");
        let mut value: serde_json::Value = serde_json::from_str(json).unwrap();
        value["waveform"] = serde_json::json!({"type": null, "bandwidth": 10e6});
        value["returns"] = serde_json::json!([{"type": "skin"}, {}]);
        value["numPulses"] = serde_json::json!(32);
        let scenario: Scenario = serde_json::from_value(value).unwrap();
        assert_eq!(scenario.waveform, WaveformSpec::Unknown);
        assert_eq!(scenario.returns, vec![ReturnSpec::Skin, ReturnSpec::Unknown]);

        let rdm = scenario.run().unwrap();
        assert_eq!(rdm.total.shape(), (100, 32));
        assert_eq!(rdm.injections.len(), 2);
        assert!(rdm.injections[1].placements.is_empty());
    }

    #[test]
    fn taper_choice_changes_only_weighting() {
        let mut scenario = skin();
        scenario.options.taper = Taper::Rectangular;
        let rect = scenario.run().unwrap();
        let cheb = skin().run().unwrap();
        let a = rect.peak(CubeKind::Signal).unwrap();
        let b = cheb.peak(CubeKind::Signal).unwrap();
        assert_eq!(a.range_bin, b.range_bin);
        assert!((a.range_rate.unwrap() - b.range_rate.unwrap()).abs() <= 7.5);
    }

    #[test]
    fn scenario_from_legacy_json() {
        let json = r#"{
            "tgtInfo": {"range": 3.5e3, "rangeRate": 0.5e3, "rcs": 10},
            "radar": {
                "fcar": 10e9, "txPower": 1e3, "txGain": 1000, "rxGain": 1000,
                "opTemp": 290, "sampRate": 20e6, "noiseFig": 6.309573444801933,
                "totalLosses": 6.309573444801933, "PRF": 200e3, "dwell_time": 2e-3
            },
            "wvf": {"type": "lfm", "bw": 10e6, "T": 1e-6, "chirpUpDown": 1},
            "returnInfo": {"type": "skin"},
            "seed": 0
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.returns, vec![ReturnSpec::Skin]);
        assert_eq!(scenario.resolved_num_pulses(), Ok(400));
        assert_eq!(scenario.options.taper, Taper::default());
        assert_relative_eq!(scenario.radar.noise_figure, skin().radar.noise_figure, max_relative = 1e-12);

        let listed = json.replace(r#""returnInfo": {"type": "skin"}"#, r#""return_list": [{"type": "skin"}, {"type": "memory", "rdot_delta": 500}]"#);
        let scenario: Scenario = serde_json::from_str(&listed).unwrap();
        assert_eq!(scenario.returns.len(), 2);
        assert_eq!(
            scenario.returns[1],
            ReturnSpec::Memory(MemoryReturn {
                rdot_delta: Some(500.),
                ..Default::default()
            })
        );
    }

    #[test]
    fn scenario_round_trips_through_json() {
        let scenario = Scenario::memory_example();
        let json = serde_json::to_string(&scenario).unwrap();
        assert!(json.contains(r#""type":"memory""#));
        let parsed: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.returns, scenario.returns);
        assert_eq!(parsed.options, scenario.options);
        assert_eq!(parsed.seed, Some(0));
        assert_eq!(parsed.resolved_num_pulses(), Ok(400));
    }

    #[test]
    fn shipped_scenarios_match_builtins() {
        let skin: Scenario = serde_json::from_str(include_str!("../scenarios/skin.json")).unwrap();
        assert_eq!(skin.returns, Scenario::skin_example().returns);
        assert_eq!(skin.waveform, Scenario::skin_example().waveform);
        assert_eq!(skin.resolved_num_pulses(), Ok(400));

        let memory: Scenario =
            serde_json::from_str(include_str!("../scenarios/memory.json")).unwrap();
        assert_eq!(memory.returns, Scenario::memory_example().returns);
        assert_eq!(memory.waveform, Scenario::memory_example().waveform);
        assert_eq!(memory.seed, Some(0));
    }
}
