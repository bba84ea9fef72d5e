/// Column names used by DWD daily climate files
pub const COL_MESS_DATUM: &str = "MESS_DATUM";
pub const COL_STATIONS_ID: &str = "STATIONS_ID";
pub const COL_STATIONSNAME: &str = "Stationsname";
pub const COL_END_OF_RECORD: &str = "eor";

/// Parameter metadata columns
pub const COL_PARAMETER: &str = "Parameter";
pub const COL_PARAMETER_DESCRIPTION: &str = "Parameterbeschreibung";
pub const COL_UNIT: &str = "Einheit";

/// Date format of MESS_DATUM and the station list validity columns
pub const DWD_DATE_FORMAT: &str = "%Y%m%d";

/// Delimiter of the parameter metadata member
pub const PARAMETER_FILE_DELIMITER: u8 = b';';

/// Measurement value columns in table order
pub const MEASUREMENT_FIELDS: [&str; 16] = [
    "qn_3", "fx", "fm", "qn_4", "rsk", "rskf", "sdk", "shk_tag", "nm", "vpm", "pm", "tmk", "upm",
    "txk", "tnk", "tgk",
];

/// Header and separator lines preceding the station list body
pub const STATION_LIST_SKIP_LINES: usize = 2;

/// Delimiter of normalized files written by the normalizer
pub const NORMALIZED_DELIMITER: u8 = b',';
