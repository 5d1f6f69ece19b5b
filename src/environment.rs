use crate::error::SimError;

// ---------------------------------------------------------------------------
// Launch environment (rail geometry, from the rocket spec file)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Environment {
    pub place: String,
    pub rail_length: f64,    // m
    pub rail_azimuth: f64,   // deg, magnetic north 0, east 90
    pub rail_elevation: f64, // deg from horizontal
}

// ---------------------------------------------------------------------------
// Flat-tangent-plane geocoordinates
// ---------------------------------------------------------------------------
//
// Fixed metres-per-degree constants; not geodesically exact, acceptable for
// short-range trajectories.

#[derive(Debug, Clone, Copy)]
pub struct GeoCoordinate {
    latitude: f64,  // deg N
    longitude: f64, // deg E
    metres_per_deg_latitude: f64,
    metres_per_deg_longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoCoordinate {
            latitude,
            longitude,
            metres_per_deg_latitude: 31.0 / 0.000_277_78,
            metres_per_deg_longitude: (6_378_150.0 * latitude.to_radians().cos()).to_degrees(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude at a northward offset from the launch point, m.
    pub fn latitude_at(&self, north_offset: f64) -> f64 {
        self.latitude + north_offset / self.metres_per_deg_latitude
    }

    /// Longitude at an eastward offset from the launch point, m.
    pub fn longitude_at(&self, east_offset: f64) -> f64 {
        self.longitude + east_offset / self.metres_per_deg_longitude
    }
}

// ---------------------------------------------------------------------------
// Launch-site table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MapData {
    pub key: &'static str,
    pub coordinate: GeoCoordinate,
    pub magnetic_declination: f64, // deg
}

impl MapData {
    /// Resolve a launch site by its spec-file place name.
    pub fn lookup(place: &str) -> Result<MapData, SimError> {
        // (key, latitude, longitude, magnetic declination)
        const SITES: [(&str, f64, f64, f64); 4] = [
            ("noshiro_land", 40.138_816, 139.984_818, 8.9),
            ("noshiro_sea", 40.242_865, 140.010_450, 8.94),
            ("izu_land", 34.735_972, 139.420_944, 7.53),
            ("izu_sea", 34.680_197, 139.435_794, 7.53),
        ];
        SITES
            .iter()
            .find(|(key, ..)| *key == place)
            .map(|&(key, latitude, longitude, magnetic_declination)| MapData {
                key,
                coordinate: GeoCoordinate::new(latitude, longitude),
                magnetic_declination,
            })
            .ok_or_else(|| SimError::UnknownPlace(place.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn known_sites_resolve() {
        for place in ["noshiro_land", "noshiro_sea", "izu_land", "izu_sea"] {
            let map = MapData::lookup(place).unwrap();
            assert_eq!(map.key, place);
        }
    }

    #[test]
    fn unknown_site_is_an_error() {
        assert!(matches!(
            MapData::lookup("tanegashima"),
            Err(SimError::UnknownPlace(_))
        ));
    }

    #[test]
    fn zero_offset_is_the_launch_point() {
        let coord = GeoCoordinate::new(40.0, 140.0);
        assert_relative_eq!(coord.latitude_at(0.0), 40.0, epsilon = 1e-12);
        assert_relative_eq!(coord.longitude_at(0.0), 140.0, epsilon = 1e-12);
    }

    #[test]
    fn northward_offset_increases_latitude() {
        let coord = GeoCoordinate::new(40.0, 140.0);
        assert!(coord.latitude_at(1_000.0) > coord.latitude());
        assert!(coord.latitude_at(-1_000.0) < coord.latitude());
        // ~111.6 km per degree.
        assert_relative_eq!(
            coord.latitude_at(111_600.0) - coord.latitude(),
            1.0,
            epsilon = 1e-2
        );
    }
}
