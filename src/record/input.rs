use std::collections::HashMap;

/// A single row of loaded tabular input, keyed by header name.
pub type Row = HashMap<String, String>;

/// One row from the source parts list.
///
/// The item code is the lookup key; everything else is descriptive data
/// carried through to the report unchanged. Records are immutable once
/// loaded and identified by their original batch position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRecord {
    pub brand: String,
    pub item_code: String,
    pub car_maker_name: String,
    pub car_model_name: String,
    pub car_chassis_name: String,
    pub car_engine_desc_name: String,
    pub car_vehicle_name: String,
    pub year_from: String,
    pub year_to: String,
    pub oem_no: String,
    pub part_description: String,
    pub alias_name: String,
    pub print_description: String,
}

impl InputRecord {
    /// Builds a record from a loaded row.
    ///
    /// Column names vary between revisions of the source spreadsheet, so
    /// each field is resolved by a fixed fallback order: canonical header
    /// first, then the known synonyms, then empty string.
    pub fn from_row(row: &Row) -> Self {
        Self {
            brand: pick(row, &["Brand"]),
            item_code: pick(row, &["ItemCode", "Item Code", "ITEM CODE"]),
            car_maker_name: pick(row, &["Car Maker Name", "CarMakerName"]),
            car_model_name: pick(row, &["Car Model Name", "CarModelName"]),
            car_chassis_name: pick(row, &["Car Chassis Name", "CarChassisName"]),
            car_engine_desc_name: pick(row, &["Car EngineDesc Name", "CarEngineDescName"]),
            car_vehicle_name: pick(row, &["Car Vehicle Name", "CarVehicleName"]),
            year_from: pick(row, &["Year From", "YearFrom"]),
            year_to: pick(row, &["Year To", "YearTo"]),
            oem_no: pick(row, &["OEM No.", "OEMNo"]),
            part_description: pick(row, &["Part Description", "PartDescription"]),
            alias_name: pick(row, &["Alias Name", "AliasName"]),
            print_description: pick(row, &["Print Description", "PrintDescription"]),
        }
    }

    /// Whether this record carries a usable lookup key.
    pub fn has_lookup_key(&self) -> bool {
        !self.item_code.trim().is_empty()
    }
}

/// Returns the first non-empty value among the given column names.
fn pick(row: &Row, names: &[&str]) -> String {
    for name in names {
        if let Some(value) = row.get(*name) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}
