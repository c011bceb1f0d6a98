use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::warn;
use uuid::Uuid;

use school_clinic_data::models::bp_form as data_bp;
use school_clinic_data::models::dental_record as data_dental;

use crate::entities::bp_form::{BpForm, BpReading, CreateBpFormRequest, CreateBpReadingRequest, OverallStatus};
use crate::entities::dental_chart::{DecodedChart, DentalChart, DentalChartError};
use crate::entities::dental_record::{CreateDentalRecordRequest, DentalRecord};

/// Conversion functions between domain entities and data models.
/// They follow the pattern convert_to_[target_layer]_[model_name].

/// Parse a string ID into a UUID with a descriptive error
pub fn parse_string_to_uuid(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|_| format!("Invalid UUID format: {}", id))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp {:?}: {}", raw, e))
}

/// Convert a stored reading into the domain entity
pub fn convert_to_domain_reading(record: data_bp::BpReadingRecord) -> Result<BpReading, String> {
    let date = record
        .date
        .parse::<NaiveDate>()
        .map_err(|e| format!("Invalid reading date {:?}: {}", record.date, e))?;
    let time = record
        .time
        .parse::<NaiveTime>()
        .map_err(|e| format!("Invalid reading time {:?}: {}", record.time, e))?;

    Ok(BpReading {
        id: record.id,
        date,
        time,
        blood_pressure: record.blood_pressure,
        has_signature: record.has_signature,
        remarks: record.remarks,
    })
}

/// Convert a stored form into the domain aggregate.
/// Readings are re-sorted and the status is recomputed from the stored remarks.
pub fn convert_to_domain_form(record: data_bp::BpFormRecord) -> Result<BpForm, String> {
    let stored_status = record.status.parse::<OverallStatus>()?;
    let created_at = parse_timestamp(&record.created_at)?;

    let mut readings = record
        .readings
        .into_iter()
        .map(convert_to_domain_reading)
        .collect::<Result<Vec<_>, _>>()?;
    readings.sort_by_key(|r| (r.date, r.time));

    let mut form = BpForm {
        id: record.id,
        patient_id: record.patient_id,
        created_at,
        readings,
        status: stored_status,
    };
    form.refresh_status();

    if form.status != stored_status {
        warn!(
            "Stored status {:?} for BP form {} disagrees with its readings, using {:?}",
            stored_status, form.id, form.status
        );
    }
    Ok(form)
}

/// Convert a domain form request into the data layer request
pub fn convert_to_data_form_request(request: &CreateBpFormRequest) -> data_bp::CreateBpFormRequest {
    data_bp::CreateBpFormRequest {
        patient_id: request.patient_id.clone(),
        status: OverallStatus::Stable.to_string(),
    }
}

/// Convert a domain reading request plus its classification remark into the data layer request
pub fn convert_to_data_reading_request(
    request: &CreateBpReadingRequest,
    remarks: &str,
) -> data_bp::CreateBpReadingRequest {
    data_bp::CreateBpReadingRequest {
        date: request.date.format("%Y-%m-%d").to_string(),
        time: request.time.format("%H:%M:%S").to_string(),
        blood_pressure: request.blood_pressure.clone(),
        remarks: remarks.to_string(),
        has_signature: request.has_signature,
    }
}

/// Convert a stored dental record into the domain entity.
/// Blank chart text reads as an empty chart. Any other text that does not
/// decode is kept verbatim in `chart_raw` next to an empty chart.
pub fn convert_to_domain_dental_record(record: data_dental::DentalRecord) -> Result<DentalRecord, String> {
    let (chart, chart_raw) = match DentalChart::decode(&record.chart) {
        DecodedChart::Chart(chart) => (chart, None),
        DecodedChart::Raw(raw) if raw.trim().is_empty() => (DentalChart::new(), None),
        DecodedChart::Raw(raw) => {
            warn!("Dental record {} holds a chart that does not decode, keeping the raw text", record.id);
            (DentalChart::new(), Some(raw))
        }
    };

    Ok(DentalRecord {
        id: record.id,
        patient_id: record.patient_id,
        chart,
        chart_raw,
        remarks: record.remarks,
        created_at: parse_timestamp(&record.created_at)?,
        updated_at: parse_timestamp(&record.updated_at)?,
    })
}

/// Convert a domain dental record request into the data layer request with an empty chart
pub fn convert_to_data_dental_record_request(
    request: &CreateDentalRecordRequest,
) -> Result<data_dental::CreateDentalRecordRequest, DentalChartError> {
    Ok(data_dental::CreateDentalRecordRequest {
        patient_id: request.patient_id.clone(),
        chart: DentalChart::new().encode()?,
        remarks: request.remarks.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::bp_form::Tier;
    use crate::entities::dental_chart::{AnnotationPatch, Design};

    fn reading_record(id: &str, date: &str, time: &str, remarks: &str) -> data_bp::BpReadingRecord {
        data_bp::BpReadingRecord {
            id: id.to_string(),
            form_id: "f1".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            blood_pressure: "150/95".to_string(),
            remarks: remarks.to_string(),
            has_signature: false,
        }
    }

    #[test]
    fn test_parse_string_to_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_string_to_uuid(&id.to_string()), Ok(id));
        assert!(parse_string_to_uuid("nope").is_err());
    }

    #[test]
    fn test_convert_form_sorts_and_recomputes_status() {
        let record = data_bp::BpFormRecord {
            id: "f1".to_string(),
            patient_id: "p1".to_string(),
            status: "Stable".to_string(),
            created_at: "2024-05-01T08:00:00+00:00".to_string(),
            readings: vec![
                reading_record("r2", "2024-05-02", "08:00:00", Tier::Stage2Hypertension.remark()),
                reading_record("r1", "2024-05-01", "08:00:00", Tier::Stage2Hypertension.remark()),
            ],
        };

        let form = convert_to_domain_form(record).unwrap();
        assert_eq!(form.readings[0].id, "r1");
        assert_eq!(form.status, OverallStatus::ElevatedBp);
    }

    #[test]
    fn test_convert_form_rejects_bad_dates() {
        let record = data_bp::BpFormRecord {
            id: "f1".to_string(),
            patient_id: "p1".to_string(),
            status: "Stable".to_string(),
            created_at: "2024-05-01T08:00:00+00:00".to_string(),
            readings: vec![reading_record("r1", "May 1st", "08:00:00", "")],
        };
        assert!(convert_to_domain_form(record).is_err());
    }

    #[test]
    fn test_reading_request_formats_date_and_time() {
        let request = CreateBpReadingRequest {
            date: "2024-05-01".parse().unwrap(),
            time: "07:05:00".parse().unwrap(),
            blood_pressure: "118/76".to_string(),
            has_signature: true,
        };
        let data = convert_to_data_reading_request(&request, Tier::Normal.remark());
        assert_eq!(data.date, "2024-05-01");
        assert_eq!(data.time, "07:05:00");
        assert_eq!(data.remarks, "Normal - BP within a healthy range");
    }

    #[test]
    fn test_convert_dental_record_decodes_chart() {
        let chart = DentalChart::new()
            .upsert_annotation(47, AnnotationPatch::design(Design::DiagonalLeft))
            .unwrap();
        let record = data_dental::DentalRecord {
            id: "d1".to_string(),
            patient_id: "p1".to_string(),
            chart: chart.encode().unwrap(),
            remarks: None,
            created_at: "2024-05-01T08:00:00+00:00".to_string(),
            updated_at: "2024-05-01T08:00:00+00:00".to_string(),
        };
        assert_eq!(convert_to_domain_dental_record(record).unwrap().chart, chart);
    }

    #[test]
    fn test_convert_dental_record_keeps_undecodable_chart_text() {
        let record = data_dental::DentalRecord {
            id: "d1".to_string(),
            patient_id: "p1".to_string(),
            chart: "legacy notes".to_string(),
            remarks: Some("from paper chart".to_string()),
            created_at: "2024-05-01T08:00:00+00:00".to_string(),
            updated_at: "2024-05-01T08:00:00+00:00".to_string(),
        };
        let converted = convert_to_domain_dental_record(record).unwrap();
        assert!(converted.chart.is_empty());
        assert_eq!(converted.chart_raw.as_deref(), Some("legacy notes"));
        assert_eq!(converted.remarks.as_deref(), Some("from paper chart"));
    }

    #[test]
    fn test_convert_dental_record_with_blank_chart_is_empty() {
        let record = data_dental::DentalRecord {
            id: "d2".to_string(),
            patient_id: "p1".to_string(),
            chart: "  ".to_string(),
            remarks: None,
            created_at: "2024-05-01T08:00:00+00:00".to_string(),
            updated_at: "2024-05-01T08:00:00+00:00".to_string(),
        };
        let converted = convert_to_domain_dental_record(record).unwrap();
        assert!(converted.chart.is_empty());
        assert!(converted.chart_raw.is_none());
    }
}
