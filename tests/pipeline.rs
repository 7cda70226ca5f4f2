use std::io::Write;
use std::path::PathBuf;

use listings_explorer::aggregator::{composition, price_table, summarize};
use listings_explorer::geo::{haversine, Coordinate, DistanceUnit};
use listings_explorer::listing::ROOM_TYPES;
use listings_explorer::map::markers;
use listings_explorer::price::PriceRange;
use listings_explorer::{
    compute, filter_and_sort, load, AreaSelection, Dataset, FilterCriteria, Listing, ListingTable,
    SortOrder,
};

const BIG_BEN: Coordinate = Coordinate::new(51.5032973, -0.1217477);

fn listing(id: i64, neighbourhood: &str, room_type: &str, price: f64, reviews: i64) -> Listing {
    Listing {
        id,
        name: format!("listing {}", id),
        host_id: 1000 + id,
        neighbourhood: neighbourhood.to_string(),
        room_type: room_type.to_string(),
        price,
        latitude: 51.52,
        longitude: -0.10,
        number_of_reviews: reviews,
        availability_365: 180,
    }
}

fn write_csv(name: &str, listings: &[Listing]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("listings-pipeline-{}-{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "id,name,host_id,host_name,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,availability_365"
    )
    .unwrap();
    for l in listings {
        writeln!(
            file,
            "{},\"{}\",{},host,{},{},{},{},{},1,{},{}",
            l.id,
            l.name,
            l.host_id,
            l.neighbourhood,
            l.latitude,
            l.longitude,
            l.room_type,
            l.price,
            l.number_of_reviews,
            l.availability_365
        )
        .unwrap();
    }
    path
}

#[test]
fn review_flag_scenario() {
    let dataset = Dataset::from_listings(&[
        listing(1, "A", "Private room", 40.0, 0),
        listing(2, "A", "Private room", 90.0, 2),
    ])
    .unwrap();

    let criteria = FilterCriteria::new(AreaSelection::neighbourhoods(["A"]), ["Private room"])
        .with_price(PriceRange::new(0.0, 99999.0))
        .with_reviews(true);
    let (view, report) = compute(&dataset, &criteria, SortOrder::ById).unwrap();

    assert_eq!(view.ids().unwrap(), vec![2]);
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.average_price, Some(90.0));
    assert_eq!(report.summary.host_count, 1);
}

#[test]
fn landmark_radius_scenario() {
    let mut at_big_ben = listing(1, "Westminster", "Entire home/apt", 150.0, 3);
    at_big_ben.latitude = BIG_BEN.latitude;
    at_big_ben.longitude = BIG_BEN.longitude;

    // Roughly 50 km north
    let mut far_away = listing(2, "Westminster", "Entire home/apt", 150.0, 3);
    far_away.latitude = BIG_BEN.latitude + 0.45;
    far_away.longitude = BIG_BEN.longitude;
    assert!(haversine(BIG_BEN, far_away.coordinate(), DistanceUnit::Kilometers) > 49.0);

    let dataset = Dataset::from_listings(&[at_big_ben, far_away]).unwrap();
    let criteria = FilterCriteria::new(
        AreaSelection::near("Big Ben", 0.5, DistanceUnit::Kilometers).unwrap(),
        ROOM_TYPES,
    );
    let view = filter_and_sort(&dataset, &criteria, SortOrder::ById).unwrap();
    assert_eq!(view.ids().unwrap(), vec![1]);

    let markers = markers(&view, criteria.area.landmark()).unwrap();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[1].label, "Big Ben");
}

#[test]
fn radius_matches_across_units() {
    let listings: Vec<Listing> = (0..40)
        .map(|i| {
            let mut l = listing(i, "Lambeth", "Private room", 60.0, 1);
            l.latitude = 51.47 + i as f64 * 0.0017;
            l.longitude = -0.16 + i as f64 * 0.0021;
            l
        })
        .collect();
    let dataset = Dataset::from_listings(&listings).unwrap();

    for radius_mi in [0.5, 1.0, 1.7, 2.4, 3.0] {
        let radius_km = DistanceUnit::Miles.convert(radius_mi, DistanceUnit::Kilometers);
        let by_mi = FilterCriteria::new(
            AreaSelection::near("Big Ben", radius_mi, DistanceUnit::Miles).unwrap(),
            ROOM_TYPES,
        );
        let by_km = FilterCriteria::new(
            AreaSelection::near("Big Ben", radius_km, DistanceUnit::Kilometers).unwrap(),
            ROOM_TYPES,
        );
        let a = filter_and_sort(&dataset, &by_mi, SortOrder::ById).unwrap();
        let b = filter_and_sort(&dataset, &by_km, SortOrder::ById).unwrap();
        assert_eq!(a.ids().unwrap(), b.ids().unwrap(), "radius {} mi", radius_mi);
    }
}

#[test]
fn invalid_radius_is_empty_not_error() {
    let dataset = Dataset::from_listings(&[listing(1, "A", "Private room", 40.0, 0)]).unwrap();
    let criteria = FilterCriteria::new(
        AreaSelection::near("Big Ben", -2.0, DistanceUnit::Miles).unwrap(),
        ROOM_TYPES,
    );
    let (view, report) = compute(&dataset, &criteria, SortOrder::PriceAscending).unwrap();
    assert!(view.is_empty());
    assert_eq!(report.summary.average_price, None);
}

#[test]
fn load_filter_and_aggregate_from_csv() {
    let listings = vec![
        listing(11, "Camden", "Private room", 55.0, 4),
        listing(12, "Camden", "Entire home/apt", 180.0, 0),
        listing(13, "Hackney", "Private room", 45.0, 9),
        listing(14, "Camden", "Private room", 55.0, 1),
        listing(15, "Hackney", "Shared room", 25.0, 2),
    ];
    let path = write_csv("full.csv", &listings);
    let dataset = load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.neighbourhoods(), ["Camden", "Hackney"]);
    assert_eq!(dataset.listings().unwrap(), listings);

    let criteria = FilterCriteria::new(
        AreaSelection::neighbourhoods(["Camden", "Hackney"]),
        ["Private room", "Shared room"],
    )
    .with_price(PriceRange::from_labels("<50", "100").unwrap());
    let view = filter_and_sort(&dataset, &criteria, SortOrder::PriceDescending).unwrap();
    assert_eq!(view.ids().unwrap(), vec![11, 14, 13, 15]);
    assert_eq!(summarize(&view).unwrap().total, view.len());

    let pivot = price_table(&dataset).unwrap();
    assert_eq!(pivot.len(), 4);
    assert!(pivot.iter().all(|row| row.count > 0));

    let comp = composition(&dataset).unwrap();
    assert_eq!(comp[0].neighbourhood, "Camden");
    assert_eq!(comp[0].total, 3);
}

#[test]
fn empty_room_types_yield_empty_view() {
    let dataset = Dataset::from_listings(&[
        listing(1, "A", "Private room", 40.0, 0),
        listing(2, "B", "Hotel room", 90.0, 2),
    ])
    .unwrap();
    for area in [
        AreaSelection::neighbourhoods(["A", "B"]),
        AreaSelection::near("Big Ben", 3.0, DistanceUnit::Miles).unwrap(),
    ] {
        let criteria = FilterCriteria::new(area, Vec::<String>::new());
        let view = filter_and_sort(&dataset, &criteria, SortOrder::ById).unwrap();
        assert!(view.is_empty());
    }
}
