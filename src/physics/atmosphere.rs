// ---------------------------------------------------------------------------
// ISA 1976 Standard Atmosphere (sea level to 86 km)
// ---------------------------------------------------------------------------

const G0: f64 = 9.806_65;      // standard gravity, m/s^2
const R_AIR: f64 = 287.052_87; // specific gas constant for dry air, J/(kg·K)
const GAMMA: f64 = 1.4;        // ratio of specific heats

const T0: f64 = 288.15;        // sea-level temperature, K
const P0: f64 = 101_325.0;     // sea-level pressure, Pa

/// Gas constants of a planet's atmosphere, as reported to vessel modules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmConstants {
    pub gamma: f64, // ratio of specific heats
    pub r: f64,     // specific gas constant, J/(kg·K)
}

impl AtmConstants {
    pub const EARTH: AtmConstants = AtmConstants { gamma: GAMMA, r: R_AIR };

    /// Specific heat at constant pressure, J/(kg·K).
    pub fn cp(&self) -> f64 {
        self.gamma * self.r / (self.gamma - 1.0)
    }

    pub fn sound_speed(&self, temperature: f64) -> f64 {
        (self.gamma * self.r * temperature).sqrt()
    }
}

/// Atmospheric properties at a given geometric altitude.
#[derive(Debug, Clone, Copy)]
pub struct Atmo {
    pub density: f64,      // kg/m^3
    pub pressure: f64,     // Pa
    pub temperature: f64,  // K
    pub sound_speed: f64,  // m/s
}

impl Atmo {
    /// Mach number of a vessel moving at `speed` through this air mass.
    pub fn mach(&self, speed: f64) -> f64 {
        if self.sound_speed > 0.0 {
            speed.abs() / self.sound_speed
        } else {
            0.0
        }
    }
}

/// ISA 1976 standard atmosphere model.
///
/// Piecewise temperature profile with 7 layers from 0-86 km.
/// Clamps negative altitudes to sea level; returns near-vacuum above 86 km.
pub fn isa(altitude_m: f64) -> Atmo {
    let h = altitude_m.max(0.0);

    let (temperature, pressure) = if h < 11_000.0 {
        // Troposphere: lapse -6.5 K/km
        gradient_layer(h, 0.0, T0, -0.0065, P0)
    } else if h < 20_000.0 {
        // Tropopause: isothermal 216.65 K
        isothermal_layer(h, 11_000.0, 216.65, 22_632.1)
    } else if h < 32_000.0 {
        // Stratosphere I: lapse +1.0 K/km
        gradient_layer(h, 20_000.0, 216.65, 0.001, 5_474.89)
    } else if h < 47_000.0 {
        // Stratosphere II: lapse +2.8 K/km
        gradient_layer(h, 32_000.0, 228.65, 0.0028, 868.019)
    } else if h < 51_000.0 {
        // Mesosphere I: isothermal 270.65 K
        isothermal_layer(h, 47_000.0, 270.65, 110.906)
    } else if h < 71_000.0 {
        // Mesosphere II: lapse -2.8 K/km
        gradient_layer(h, 51_000.0, 270.65, -0.0028, 66.9389)
    } else if h < 86_000.0 {
        // Mesosphere III: lapse -2.0 K/km
        gradient_layer(h, 71_000.0, 214.65, -0.002, 3.956_42)
    } else {
        // Above 86 km: exponential decay approximation
        let t = 186.87;
        let p = 0.3734 * (-0.000_15 * (h - 86_000.0)).exp();
        (t, p.max(0.0))
    };

    let density = if temperature > 0.0 {
        pressure / (R_AIR * temperature)
    } else {
        0.0
    };

    Atmo {
        density,
        pressure,
        temperature,
        sound_speed: AtmConstants::EARTH.sound_speed(temperature),
    }
}

// ---------------------------------------------------------------------------
// Layer helpers
// ---------------------------------------------------------------------------

fn gradient_layer(h: f64, h_base: f64, t_base: f64, lapse: f64, p_base: f64) -> (f64, f64) {
    let t = t_base + lapse * (h - h_base);
    let p = p_base * (t / t_base).powf(-G0 / (lapse * R_AIR));
    (t, p)
}

fn isothermal_layer(h: f64, h_base: f64, t: f64, p_base: f64) -> (f64, f64) {
    let p = p_base * ((-G0 / (R_AIR * t)) * (h - h_base)).exp();
    (t, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_join_continuously() {
        for base in [11_000.0, 20_000.0, 32_000.0, 47_000.0, 51_000.0, 71_000.0] {
            let below = isa(base - 1e-6);
            let above = isa(base);
            assert!((below.temperature - above.temperature).abs() < 1e-6, "T jump at {base} m");
            assert!(
                (below.pressure - above.pressure).abs() / above.pressure < 1e-3,
                "p jump at {base} m"
            );
        }
    }

    #[test]
    fn sea_level_standard_values() {
        let a = isa(0.0);
        assert!((a.temperature - 288.15).abs() < 0.01);
        assert!((a.pressure - 101_325.0).abs() < 1.0);
        assert!((a.density - 1.225).abs() < 0.001);
        assert!((a.sound_speed - 340.29).abs() < 0.1);
    }

    #[test]
    fn scramjet_corridor_is_thin_and_cold() {
        let a = isa(25_000.0);
        assert!(a.temperature > 216.0 && a.temperature < 225.0);
        assert!(a.pressure < 3_000.0 && a.pressure > 2_000.0);
    }

    #[test]
    fn cp_of_air() {
        assert!((AtmConstants::EARTH.cp() - 1004.68).abs() < 0.1);
    }

    #[test]
    fn mach_from_speed() {
        let a = isa(0.0);
        assert!((a.mach(a.sound_speed * 3.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn negative_altitude_clamps_to_sea_level() {
        let a = isa(-500.0);
        assert!((a.temperature - 288.15).abs() < 0.01);
    }
}
