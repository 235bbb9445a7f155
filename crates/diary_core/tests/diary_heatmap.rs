use std::fs;
use std::path::PathBuf;

use diary_core::{
    calendar::{CalendarSystem, CivilDate},
    grid::{GridGeometry, ValueRange},
    settings::{HeatmapSettings, SettingsStore},
    DiaryService,
};
use tempfile::tempdir;

fn write_file(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write fixture");
}

#[test]
fn persian_diary_rendered_in_both_calendars() {
    let temp = tempdir().expect("tempdir");
    let diary = temp.path().join("Diary");

    write_file(
        &diary.join("1402-12-29.md"),
        "---\nmood: calm\n---\n\nLast day of the year, quiet evening at home.",
    );
    write_file(
        &diary.join("1403-01-01 Nowruz.md"),
        "---\ntags: [holiday]\n---\nVisited family. Long lunch. Walked in the park afterwards with everyone.",
    );
    write_file(&diary.join("1403-01-02.md"), "---\nempty: true\n---\n");
    write_file(&diary.join("templates/daily.md"), "# {{date}}");

    let settings_store = SettingsStore::new(temp.path().join(".heatmap/settings.json"));
    let mut settings = settings_store.load().expect("load default settings");
    settings.diary_path = diary.clone();
    settings_store.save(&settings).expect("save settings");

    let mut settings: HeatmapSettings = settings_store.load().expect("reload settings");
    let service = DiaryService::builder()
        .add_root(&settings.diary_path)
        .build()
        .expect("build diary service");
    let geometry = GridGeometry::from_view_width(1100.0);

    let entries = service.entries();
    assert_eq!(entries.len(), 3, "template without a date is ignored");

    let persian = service
        .heatmap(&settings.config().expect("valid config"), &geometry)
        .expect("persian heatmap");
    let labels: Vec<i32> = persian.years.iter().map(|grid| grid.year_label).collect();
    assert_eq!(labels, vec![1403, 1402]);
    assert_eq!(persian.range, ValueRange { min: 0, max: 11 });

    let nowruz = CivilDate::first_of_year(CalendarSystem::Persian, 1403);
    let first_cell = &persian.years[0].cells[0];
    assert_eq!(first_cell.date, nowruz);
    assert_eq!(first_cell.value, Some(11));
    assert!(first_cell.color.is_some());
    assert_eq!(
        persian.years[0].cells[1].color,
        None,
        "an entry without words renders empty"
    );
    assert_eq!(persian.years[0].cells.len(), 366);

    settings.display_calendar = "gregorian".into();
    let gregorian = service
        .heatmap(&settings.config().expect("valid config"), &geometry)
        .expect("gregorian heatmap");
    assert_eq!(gregorian.years.len(), 1);
    assert_eq!(gregorian.years[0].year_label, 2024);
    let colored: Vec<String> = gregorian.years[0]
        .cells
        .iter()
        .filter(|cell| cell.color.is_some())
        .map(|cell| cell.date.to_string())
        .collect();
    assert_eq!(colored, vec!["2024-03-19", "2024-03-20"]);

    settings.notes_calendar = "lunar".into();
    assert!(settings.config().is_err());
}
