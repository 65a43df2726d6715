//! Solver input files.
//!
//! - `input_settings.txt`: one model flag per line, `value\t#\tname (description)`
//! - `input_history.txt`: tab-separated `time  temperature  fission-rate  stress`
//!   rows, linearly interpolated by the solver
//!
//! Neither file ends with a newline; the solver reads them token by token.

use std::fs;
use std::path::Path;

use crate::error::AppError;

pub const SETTINGS_FILE: &str = "input_settings.txt";
pub const HISTORY_FILE: &str = "input_history.txt";

/// Flag varied by the threshold maps by default.
pub const VENTING_FLAG: &str = "iGrainBoundaryVenting";

const DEFAULT_FLAGS: [(i32, &str, &str); 23] = [
    (1, "iGrainGrowth", "0= no grain growth, 1= Ainscough et al. (1973), 2= Van Uffelen et al. (2013)"),
    (1, "iFGDiffusionCoefficient", "0= constant value, 1= Turnbull et al. (1988)"),
    (
        1,
        "iDiffusionSolver",
        "1= SDA with quasi-stationary hypothesis, 2= SDA without quasi-stationary hypothesis",
    ),
    (1, "iIntraGranularBubbleEvolution", "1= Pizzocri et al. (2018)"),
    (
        1,
        "iResolutionRate",
        "0= constant value, 1= Turnbull (1971), 2= Losonen (2000), 3= thermal resolution, Cognini et al. (2021)",
    ),
    (1, "iTrappingRate", "0= constant value, 1= Ham (1958)"),
    (1, "iNucleationRate", "0= constant value, 1= Olander, Wongsawaeng (2006)"),
    (1, "iOutput", "1= default output files"),
    (
        2,
        "iGrainBoundaryVacancyDiffusivity",
        "0= constant value, 1= Reynolds and Burton (1979), 2= White (2004)",
    ),
    (1, "iGrainBoundaryBehaviour", "0= no grain boundary bubbles, 1= Pastore et al (2013)"),
    (1, "iGrainBoundaryMicroCracking", "0= no model considered, 1= Barani et al. (2017)"),
    (0, "iFuelMatrix", "0= UO2, 1= UO2 + HBS"),
    (
        0,
        "iGrainBoundaryVenting",
        "0= no model considered, 1= Pizzocri et al., D6.4 (2020), H2020 Project INSPYRE",
    ),
    (0, "iRadioactiveFissionGas", "0= not considered"),
    (0, "iHelium", "0= not considered"),
    (
        0,
        "iHeDiffusivity",
        "0= null value, 1= limited lattice damage, Luzzi et al. (2018), 2= significant lattice damage, Luzzi et al. (2018)",
    ),
    (0, "iGrainBoundarySweeping", "0= no model considered, 1= TRANSURANUS swept volume model"),
    (
        0,
        "iHighBurnupStructureFormation",
        "0= no model considered, 1= fraction of HBS-restructured volume from Barani et al. (2020)",
    ),
    (0, "iHBS_FGDiffusionCoefficient", "0= constant value"),
    (
        0,
        "iHighBurnupStructurePorosity",
        "0= no evolution of HBS porosity, 1= HBS porosity evolution based on Spino et al. (2006) data",
    ),
    (
        0,
        "iHeliumProductionRate",
        "0= zero production rate, 1= helium from ternary fissions, 2= linear with burnup (FR)",
    ),
    (
        0,
        "iStoichiometryDeviation",
        "0= not considered, 1= Cox et al. 1986, 2= Bittel et al. 1969, 3= Abrefah et al. 1994, 4= Imamura et al. 1997, 5= Langmuir-based approach",
    ),
    (0, "iBubbleDiffusivity", "0= not considered, 1= volume diffusivity"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFlag {
    pub name: String,
    pub value: i32,
    pub description: String,
}

/// Ordered model flags of `input_settings.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverSettings {
    flags: Vec<SettingsFlag>,
}

impl Default for SolverSettings {
    /// The flag set used by the threshold maps.
    fn default() -> Self {
        let flags = DEFAULT_FLAGS
            .iter()
            .map(|&(value, name, description)| SettingsFlag {
                name: name.to_string(),
                value,
                description: description.to_string(),
            })
            .collect();
        Self { flags }
    }
}

impl SolverSettings {
    pub fn flags(&self) -> &[SettingsFlag] {
        &self.flags
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.flags.iter().find(|f| f.name == name).map(|f| f.value)
    }

    /// Override an existing flag; unknown names are rejected.
    pub fn set(&mut self, name: &str, value: i32) -> Result<(), AppError> {
        let flag = self.flags.iter_mut().find(|f| f.name == name).ok_or_else(|| {
            AppError::input(format!("Unknown settings flag '{name}'."))
        })?;
        flag.value = value;
        Ok(())
    }

    /// Parse `value # name (description)` lines. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let mut flags = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (value, rest) = line.split_once('#').ok_or_else(|| {
                AppError::input(format!("Settings line {} has no '#' separator: '{line}'", i + 1))
            })?;
            let value = value.trim().parse::<i32>().map_err(|e| {
                AppError::input(format!("Invalid flag value on settings line {}: {e}", i + 1))
            })?;

            let rest = rest.trim();
            let (name, description) = match rest.split_once('(') {
                Some((name, desc)) => (name.trim(), desc.strip_suffix(')').unwrap_or(desc).trim()),
                None => (rest, ""),
            };
            if name.is_empty() {
                return Err(AppError::input(format!("Settings line {} has no flag name.", i + 1)));
            }

            flags.push(SettingsFlag {
                name: name.to_string(),
                value,
                description: description.to_string(),
            });
        }
        Ok(Self { flags })
    }

    pub fn read(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::input(format!("Failed to read settings '{}': {e}", path.display())))?;
        Self::parse(&text)
    }

    pub fn render(&self) -> String {
        self.flags
            .iter()
            .map(|f| {
                if f.description.is_empty() {
                    format!("{}\t#\t{}", f.value, f.name)
                } else {
                    format!("{}\t#\t{} ({})", f.value, f.name, f.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn write(&self, path: &Path) -> Result<(), AppError> {
        fs::write(path, self.render())
            .map_err(|e| AppError::input(format!("Failed to write settings '{}': {e}", path.display())))
    }
}

/// One row of `input_history.txt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    /// Time (h).
    pub time: f64,
    /// Temperature (K).
    pub temperature: f64,
    /// Fission rate (fiss / m3 s).
    pub fission_rate: f64,
    /// Hydrostatic stress (MPa).
    pub hydrostatic_stress: f64,
}

/// Two-point history holding temperature, fission rate and stress constant.
pub fn constant_history(
    time_start: f64,
    time_end: f64,
    temperature: f64,
    fission_rate: f64,
    hydrostatic_stress: f64,
) -> [HistoryPoint; 2] {
    let at = |time| HistoryPoint {
        time,
        temperature,
        fission_rate,
        hydrostatic_stress,
    };
    [at(time_start), at(time_end)]
}

pub fn render_history(points: &[HistoryPoint]) -> String {
    points
        .iter()
        .map(|p| {
            format!(
                "{}\t{}\t{}\t{}",
                format_number(p.time),
                format_number(p.temperature),
                format_number(p.fission_rate),
                format_number(p.hydrostatic_stress)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_history(path: &Path, points: &[HistoryPoint]) -> Result<(), AppError> {
    fs::write(path, render_history(points))
        .map_err(|e| AppError::input(format!("Failed to write history '{}': {e}", path.display())))
}

/// Integers print without a fraction, very large or small magnitudes in
/// exponent form (`3e18`).
pub fn format_number(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 {
        "0".to_string()
    } else if v.fract() == 0.0 && a < 1e15 {
        format!("{}", v as i64)
    } else if !(1e-4..1e15).contains(&a) {
        format!("{v:e}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_round_trip_through_text() {
        let s = SolverSettings::default();
        assert_eq!(s.flags().len(), 23);
        assert_eq!(s.get("iGrainBoundaryVacancyDiffusivity"), Some(2));

        let text = s.render();
        assert!(!text.ends_with('\n'));
        assert!(text.starts_with(
            "1\t#\tiGrainGrowth (0= no grain growth, 1= Ainscough et al. (1973), 2= Van Uffelen et al. (2013))\n"
        ));
        assert_eq!(SolverSettings::parse(&text).unwrap(), s);
    }

    #[test]
    fn set_overrides_known_flag_only() {
        let mut s = SolverSettings::default();
        s.set(VENTING_FLAG, 3).unwrap();
        assert_eq!(s.get(VENTING_FLAG), Some(3));
        assert!(s.render().contains("3\t#\tiGrainBoundaryVenting (0= no model considered"));

        let err = s.set("iNoSuchFlag", 1).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn history_rows_match_solver_format() {
        let h = constant_history(0.0, 30000.0, 650.0, 3e18, 0.0);
        assert_eq!(render_history(&h), "0\t650\t3e18\t0\n30000\t650\t3e18\t0");
    }

    #[test]
    fn format_number_cases() {
        assert_eq!(format_number(1800.0), "1800");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-2.5e-7), "-2.5e-7");
        assert_eq!(format_number(1e20), "1e20");
    }

    #[test]
    fn write_and_read_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut s = SolverSettings::default();
        s.set(VENTING_FLAG, 1).unwrap();
        s.write(&path).unwrap();
        assert_eq!(SolverSettings::read(&path).unwrap().get(VENTING_FLAG), Some(1));
    }
}
