use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of observations for one station.
///
/// Missing observations are `None`, never a sentinel value. The quality flags
/// and the precipitation form are integers; everything else is a float.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub station_id: i64,
    pub date: NaiveDate,

    pub qn_3: Option<i64>,
    pub fx: Option<f64>,
    pub fm: Option<f64>,
    pub qn_4: Option<i64>,
    pub rsk: Option<f64>,
    pub rskf: Option<i64>,
    pub sdk: Option<f64>,
    pub shk_tag: Option<f64>,
    pub nm: Option<f64>,
    pub vpm: Option<f64>,
    pub pm: Option<f64>,
    pub tmk: Option<f64>,
    pub upm: Option<f64>,
    pub txk: Option<f64>,
    pub tnk: Option<f64>,
    pub tgk: Option<f64>,
}

impl Measurement {
    pub fn new(station_id: i64, date: NaiveDate) -> Self {
        Self {
            station_id,
            date,
            ..Default::default()
        }
    }

    /// Value of a parameter by code, matched case-insensitively against the
    /// column names. Unknown codes yield `None`.
    pub fn value(&self, code: &str) -> Option<f64> {
        match code.trim().to_ascii_lowercase().as_str() {
            "qn_3" => self.qn_3.map(|v| v as f64),
            "fx" => self.fx,
            "fm" => self.fm,
            "qn_4" => self.qn_4.map(|v| v as f64),
            "rsk" => self.rsk,
            "rskf" => self.rskf.map(|v| v as f64),
            "sdk" => self.sdk,
            "shk_tag" => self.shk_tag,
            "nm" => self.nm,
            "vpm" => self.vpm,
            "pm" => self.pm,
            "tmk" => self.tmk,
            "upm" => self.upm,
            "txk" => self.txk,
            "tnk" => self.tnk,
            "tgk" => self.tgk,
            _ => None,
        }
    }

    /// Set a field from a raw cell. Unparsable or empty cells become `None`.
    /// Returns `false` when `field` is not a measurement column.
    pub fn set_from_str(&mut self, field: &str, raw: &str) -> bool {
        let float = parse_float(raw);
        match field.trim().to_ascii_lowercase().as_str() {
            "qn_3" => self.qn_3 = parse_int(raw),
            "fx" => self.fx = float,
            "fm" => self.fm = float,
            "qn_4" => self.qn_4 = parse_int(raw),
            "rsk" => self.rsk = float,
            "rskf" => self.rskf = parse_int(raw),
            "sdk" => self.sdk = float,
            "shk_tag" => self.shk_tag = float,
            "nm" => self.nm = float,
            "vpm" => self.vpm = float,
            "pm" => self.pm = float,
            "tmk" => self.tmk = float,
            "upm" => self.upm = float,
            "txk" => self.txk = float,
            "tnk" => self.tnk = float,
            "tgk" => self.tgk = float,
            _ => return false,
        }
        true
    }

    /// True if at least one observation is present
    pub fn has_values(&self) -> bool {
        crate::utils::MEASUREMENT_FIELDS
            .iter()
            .any(|field| self.value(field).is_some())
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer columns accept float notation (`1.0`) as long as there is no
/// fractional part.
fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        parse_float(trimmed)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}
