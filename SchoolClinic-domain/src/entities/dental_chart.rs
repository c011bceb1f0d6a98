use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Primary dentition in chart order: upper row then lower row
pub const PRIMARY_TEETH: [u8; 20] = [
    55, 54, 53, 52, 51, 61, 62, 63, 64, 65,
    85, 84, 83, 82, 81, 71, 72, 73, 74, 75,
];

/// Permanent dentition in chart order: upper row then lower row
pub const PERMANENT_TEETH: [u8; 32] = [
    18, 17, 16, 15, 14, 13, 12, 11, 21, 22, 23, 24, 25, 26, 27, 28,
    48, 47, 46, 45, 44, 43, 42, 41, 31, 32, 33, 34, 35, 36, 37, 38,
];

/// Teeth drawn with the inner concentric circle.
/// Historically called "molars", though 13 is a canine.
pub const DUAL_CIRCLE_TEETH: [u8; 6] = [14, 47, 13, 26, 65, 37];

/// Errors raised by the dental chart model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DentalChartError {
    #[error("{0} is not a tooth number in the primary or permanent dentition")]
    UnknownTooth(u8),

    #[error("chart key {key:?} does not match tooth number {number}")]
    KeyMismatch { key: String, number: u8 },

    #[error("tooth {number} is {expected:?} dentition, not {found:?}")]
    DentitionMismatch {
        number: u8,
        expected: Dentition,
        found: Dentition,
    },

    #[error("unknown dental symbol {0:?}")]
    UnknownSymbol(String),

    #[error("failed to encode dental chart: {0}")]
    Encode(String),
}

/// Primary (baby) or permanent (adult) teeth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Dentition {
    Primary,
    Permanent,
}

impl Dentition {
    /// Every tooth of this dentition in chart order
    pub fn teeth(self) -> &'static [u8] {
        match self {
            Dentition::Primary => &PRIMARY_TEETH,
            Dentition::Permanent => &PERMANENT_TEETH,
        }
    }

    pub fn upper_row(self) -> &'static [u8] {
        let teeth = self.teeth();
        &teeth[..teeth.len() / 2]
    }

    pub fn lower_row(self) -> &'static [u8] {
        let teeth = self.teeth();
        &teeth[teeth.len() / 2..]
    }
}

/// A tooth number from the fixed primary + permanent universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ToothNumber(u8);

impl ToothNumber {
    pub fn get(self) -> u8 {
        self.0
    }

    pub fn dentition(self) -> Dentition {
        if PRIMARY_TEETH.contains(&self.0) {
            Dentition::Primary
        } else {
            Dentition::Permanent
        }
    }

    /// Whether the tooth is drawn with the dual-circle style
    pub fn uses_dual_circle_style(self) -> bool {
        DUAL_CIRCLE_TEETH.contains(&self.0)
    }
}

impl TryFrom<u8> for ToothNumber {
    type Error = DentalChartError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if PRIMARY_TEETH.contains(&value) || PERMANENT_TEETH.contains(&value) {
            Ok(ToothNumber(value))
        } else {
            Err(DentalChartError::UnknownTooth(value))
        }
    }
}

impl From<ToothNumber> for u8 {
    fn from(tooth: ToothNumber) -> Self {
        tooth.0
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual fill applied to a tooth. Designs are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Design {
    #[default]
    None,
    Filled,
    DiagonalLeft,
    DiagonalRight,
    DiagonalTop,
    DiagonalBottom,
    UpperLeftDot,
    BottomLeftDot,
    LeftDot,
    RightDot,
    BottomRightDot,
    TopRightDot,
    BottomDot,
}

/// Which legend group a symbol belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum SymbolGroup {
    Examination,
    Restoration,
    Accomplishment,
}

/// Clinical annotation code attached to a tooth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Symbol {
    X,
    C,
    #[serde(rename = "RF")]
    Rf,
    M,
    F2,
    #[serde(rename = "Heavy shade")]
    HeavyShade,
    #[serde(rename = "Outline of filling")]
    OutlineOfFilling,
    #[serde(rename = "JC")]
    Jc,
    #[serde(rename = "AB")]
    Ab,
    P,
    I,
    #[serde(rename = "RPD")]
    Rpd,
    #[serde(rename = "FB")]
    Fb,
    #[serde(rename = "CD")]
    Cd,
    #[serde(rename = "OP")]
    Op,
    Xt,
    #[serde(rename = "Ag F")]
    AgF,
    #[serde(rename = "Sy F")]
    SyF,
    #[serde(rename = "GIC")]
    Gic,
    #[serde(rename = "ZnO F")]
    ZnOF,
    R,
}

impl Symbol {
    pub const ALL: [Symbol; 21] = [
        Symbol::X,
        Symbol::C,
        Symbol::Rf,
        Symbol::M,
        Symbol::F2,
        Symbol::HeavyShade,
        Symbol::OutlineOfFilling,
        Symbol::Jc,
        Symbol::Ab,
        Symbol::P,
        Symbol::I,
        Symbol::Rpd,
        Symbol::Fb,
        Symbol::Cd,
        Symbol::Op,
        Symbol::Xt,
        Symbol::AgF,
        Symbol::SyF,
        Symbol::Gic,
        Symbol::ZnOF,
        Symbol::R,
    ];

    /// Literal code as written on the chart
    pub const fn as_code(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::C => "C",
            Symbol::Rf => "RF",
            Symbol::M => "M",
            Symbol::F2 => "F2",
            Symbol::HeavyShade => "Heavy shade",
            Symbol::OutlineOfFilling => "Outline of filling",
            Symbol::Jc => "JC",
            Symbol::Ab => "AB",
            Symbol::P => "P",
            Symbol::I => "I",
            Symbol::Rpd => "RPD",
            Symbol::Fb => "FB",
            Symbol::Cd => "CD",
            Symbol::Op => "OP",
            Symbol::Xt => "Xt",
            Symbol::AgF => "Ag F",
            Symbol::SyF => "Sy F",
            Symbol::Gic => "GIC",
            Symbol::ZnOF => "ZnO F",
            Symbol::R => "R",
        }
    }

    pub const fn group(self) -> SymbolGroup {
        match self {
            Symbol::X
            | Symbol::C
            | Symbol::Rf
            | Symbol::M
            | Symbol::F2
            | Symbol::HeavyShade
            | Symbol::OutlineOfFilling => SymbolGroup::Examination,
            Symbol::Jc | Symbol::Ab | Symbol::P | Symbol::I | Symbol::Rpd | Symbol::Fb | Symbol::Cd => {
                SymbolGroup::Restoration
            }
            Symbol::Op | Symbol::Xt | Symbol::AgF | Symbol::SyF | Symbol::Gic | Symbol::ZnOF | Symbol::R => {
                SymbolGroup::Accomplishment
            }
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for Symbol {
    type Err = DentalChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_code() == s)
            .ok_or_else(|| DentalChartError::UnknownSymbol(s.to_string()))
    }
}

/// Parse a persisted symbol field, where "" means no symbol
pub fn parse_symbol_field(raw: &str) -> Result<Option<Symbol>, DentalChartError> {
    if raw.is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

/// Annotation of one tooth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ToothAnnotation {
    pub tooth: ToothNumber,
    pub design: Design,
    pub symbol: Option<Symbol>,
    pub remarks: String,
}

impl ToothAnnotation {
    /// Blank annotation used the first time a tooth is touched
    pub fn new(tooth: ToothNumber) -> Self {
        Self {
            tooth,
            design: Design::None,
            symbol: None,
            remarks: String::new(),
        }
    }

    fn apply(&mut self, patch: AnnotationPatch) {
        if let Some(design) = patch.design {
            self.design = design;
        }
        if let Some(symbol) = patch.symbol {
            self.symbol = symbol;
        }
        if let Some(remarks) = patch.remarks {
            self.remarks = remarks;
        }
    }
}

/// Partial update of one tooth. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationPatch {
    pub design: Option<Design>,
    /// `Some(None)` clears the symbol
    pub symbol: Option<Option<Symbol>>,
    pub remarks: Option<String>,
}

impl AnnotationPatch {
    pub fn design(design: Design) -> Self {
        Self {
            design: Some(design),
            ..Self::default()
        }
    }

    pub fn symbol(symbol: Option<Symbol>) -> Self {
        Self {
            symbol: Some(symbol),
            ..Self::default()
        }
    }

    pub fn remarks(remarks: impl Into<String>) -> Self {
        Self {
            remarks: Some(remarks.into()),
            ..Self::default()
        }
    }

    pub fn with_design(mut self, design: Design) -> Self {
        self.design = Some(design);
        self
    }

    pub fn with_symbol(mut self, symbol: Option<Symbol>) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// Tooth-keyed annotations of one dental record.
/// A tooth without an entry has no annotation at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PersistedChart", try_from = "PersistedChart")]
pub struct DentalChart {
    teeth: BTreeMap<ToothNumber, ToothAnnotation>,
}

impl DentalChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tooth: ToothNumber) -> Option<&ToothAnnotation> {
        self.teeth.get(&tooth)
    }

    /// Annotations in ascending tooth number order
    pub fn annotations(&self) -> impl Iterator<Item = &ToothAnnotation> {
        self.teeth.values()
    }

    pub fn len(&self) -> usize {
        self.teeth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }

    /// Return a new chart with `patch` applied to tooth `number`.
    /// A tooth seen for the first time starts from a blank annotation.
    pub fn upsert_annotation(&self, number: u8, patch: AnnotationPatch) -> Result<DentalChart, DentalChartError> {
        let tooth = ToothNumber::try_from(number)?;

        let mut chart = self.clone();
        chart
            .teeth
            .entry(tooth)
            .or_insert_with(|| ToothAnnotation::new(tooth))
            .apply(patch);
        Ok(chart)
    }

    /// Persisted JSON text of the chart
    pub fn encode(&self) -> Result<String, DentalChartError> {
        serde_json::to_string(self).map_err(|e| DentalChartError::Encode(e.to_string()))
    }

    /// Parse persisted chart text. Anything that is not a valid chart
    /// comes back unchanged as `Raw`.
    pub fn decode(raw: &str) -> DecodedChart {
        match serde_json::from_str::<DentalChart>(raw) {
            Ok(chart) => DecodedChart::Chart(chart),
            Err(_) => DecodedChart::Raw(raw.to_string()),
        }
    }
}

/// Result of the lenient chart decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedChart {
    Chart(DentalChart),
    Raw(String),
}

impl DecodedChart {
    pub fn into_chart_or_empty(self) -> DentalChart {
        match self {
            DecodedChart::Chart(chart) => chart,
            DecodedChart::Raw(_) => DentalChart::new(),
        }
    }
}

/// Wire shape of one tooth in the persisted chart
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedTooth {
    number: u8,
    #[serde(rename = "type")]
    dentition: Dentition,
    #[serde(default)]
    design: Design,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct PersistedChart(BTreeMap<String, PersistedTooth>);

impl From<DentalChart> for PersistedChart {
    fn from(chart: DentalChart) -> Self {
        let teeth = chart
            .teeth
            .into_values()
            .map(|annotation| {
                let tooth = PersistedTooth {
                    number: annotation.tooth.get(),
                    dentition: annotation.tooth.dentition(),
                    design: annotation.design,
                    symbol: annotation.symbol.map(|s| s.as_code().to_string()).unwrap_or_default(),
                    remarks: annotation.remarks,
                };
                (annotation.tooth.to_string(), tooth)
            })
            .collect();
        PersistedChart(teeth)
    }
}

impl TryFrom<PersistedChart> for DentalChart {
    type Error = DentalChartError;

    fn try_from(persisted: PersistedChart) -> Result<Self, Self::Error> {
        let mut teeth = BTreeMap::new();
        for (key, entry) in persisted.0 {
            let tooth = ToothNumber::try_from(entry.number)?;
            if key != tooth.to_string() {
                return Err(DentalChartError::KeyMismatch { key, number: entry.number });
            }
            if entry.dentition != tooth.dentition() {
                return Err(DentalChartError::DentitionMismatch {
                    number: entry.number,
                    expected: tooth.dentition(),
                    found: entry.dentition,
                });
            }

            let annotation = ToothAnnotation {
                tooth,
                design: entry.design,
                symbol: parse_symbol_field(&entry.symbol)?,
                remarks: entry.remarks,
            };
            teeth.insert(tooth, annotation);
        }
        Ok(DentalChart { teeth })
    }
}
