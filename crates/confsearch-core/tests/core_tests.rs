use std::fs;
use tempfile::TempDir;

use chrono::NaiveDate;
use confsearch_core::data_loader::DataLoader;
use confsearch_core::Error;

const HEADER: &str = "id,groupId,name,description,startDate,endDate,formattedLocation,countryDescription,attendeesCount,companyAttendeesCount,investorAttendeesCount,attendeeNamesConcatString,industrySectorsConcatString,industryGroupsConcatString,industryCodesConcatString";

#[test]
fn load_file_parses_positional_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("conferences.csv");
    fs::write(
        &path,
        format!(
            "{HEADER}\nc-1,7,Money20/20,Payments show,2024-06-04,2024-06-06,Amsterdam,Netherlands,5000,900,120,\"Adyen, Stripe\",Financials,Diversified Financials,6199\n"
        ),
    )
    .unwrap();

    let conferences = DataLoader::new().load_file(&path).expect("load");

    assert_eq!(conferences.len(), 1);
    let c = &conferences[0];
    assert_eq!(c.id, "c-1");
    assert_eq!(c.group_id, Some(7));
    assert_eq!(c.name, "Money20/20");
    assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2024, 6, 4));
    assert_eq!(c.attendees_count, Some(5000));
    assert_eq!(c.attendee_names, "Adyen, Stripe");
    assert_eq!(c.industry_codes, "6199");
    assert!(c.embedding.is_none());
}

#[test]
fn blank_cells_and_blank_lines_are_tolerated() {
    let data = format!("{HEADER}\nc-1,,Summit,,,,,,,,,,,,\n\n  c-2 ,,Expo,,,,Berlin,,,,,,,,\n");
    let conferences = DataLoader::new().parse(data.as_bytes()).expect("parse");

    assert_eq!(conferences.len(), 2);
    assert_eq!(conferences[0].group_id, None);
    assert_eq!(conferences[0].start_date, None);
    assert_eq!(conferences[1].id, "c-2");
    assert_eq!(conferences[1].formatted_location, "Berlin");
}

#[test]
fn header_only_file_is_a_data_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.csv");
    fs::write(&path, format!("{HEADER}\n")).unwrap();

    let err = DataLoader::new().load_file(&path).unwrap_err();
    assert!(matches!(err, Error::Data(_)), "got {err:?}");
}

#[test]
fn malformed_number_reports_line() {
    let data = format!("{HEADER}\nc-1,seven,Summit,,,,,,,,,,,,\n");
    let err = DataLoader::new().parse(data.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("line 2"), "got {err}");
}
