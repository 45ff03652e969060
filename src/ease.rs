use std::fmt;
use std::str::FromStr;

/// Easing curves, named after the GSAP power family the site was tuned with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ease {
    Linear,
    Power2In,
    Power2Out,
    Power2InOut,
    Power3Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power2In => t * t * t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::Power2In => "power2.in",
            Self::Power2Out => "power2.out",
            Self::Power2InOut => "power2.inout",
            Self::Power3Out => "power3.out",
        };
        f.write_str(name)
    }
}

impl FromStr for Ease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], ".").as_str() {
            "linear" | "none" => Ok(Self::Linear),
            "power2.in" => Ok(Self::Power2In),
            "power2.out" => Ok(Self::Power2Out),
            "power2.inout" | "power2.in.out" => Ok(Self::Power2InOut),
            "power3.out" => Ok(Self::Power3Out),
            other => Err(format!("unknown ease '{other}'")),
        }
    }
}

/// A single scalar animation with an optional start delay.
#[derive(Clone, Debug)]
pub struct Tween {
    ease: Ease,
    from: f32,
    to: f32,
    delay: f32,
    duration: f32,
    elapsed: f32,
}

impl Tween {
    pub fn new(ease: Ease, from: f32, to: f32, duration: f32) -> Self {
        Self {
            ease,
            from,
            to,
            delay: 0.0,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Advances the clock and returns the current value.
    pub fn apply(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0);
        self.value()
    }

    pub fn value(&self) -> f32 {
        let active = self.elapsed - self.delay;
        if active < 0.0 {
            return self.from;
        }
        if self.duration <= f32::EPSILON || active >= self.duration {
            return self.to;
        }
        let eased = self.ease.apply(active / self.duration);
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 5] = [
        Ease::Linear,
        Ease::Power2In,
        Ease::Power2Out,
        Ease::Power2InOut,
        Ease::Power3Out,
    ];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
        }
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in ALL {
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b, "{ease}");
            assert!(b < c, "{ease}");
        }
    }

    #[test]
    fn out_curve_front_loads_motion() {
        assert!(Ease::Power2Out.apply(0.5) > 0.5);
        assert!(Ease::Power2In.apply(0.5) < 0.5);
    }

    #[test]
    fn parses_gsap_names() {
        assert_eq!("power2.out".parse::<Ease>().unwrap(), Ease::Power2Out);
        assert_eq!("Power2_In".parse::<Ease>().unwrap(), Ease::Power2In);
        assert_eq!("none".parse::<Ease>().unwrap(), Ease::Linear);
        assert!("bounce".parse::<Ease>().is_err());
        for ease in ALL {
            assert_eq!(ease.to_string().parse::<Ease>().unwrap(), ease);
        }
    }

    #[test]
    fn tween_holds_start_value_during_delay() {
        let mut tween = Tween::new(Ease::Linear, 100.0, 0.0, 0.5).with_delay(0.2);
        assert_eq!(tween.apply(0.1), 100.0);
        assert!(!tween.is_finished());
        let v = tween.apply(0.35);
        assert!((v - 50.0).abs() < 1e-3);
        assert_eq!(tween.apply(1.0), 0.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let mut tween = Tween::new(Ease::Power2Out, 0.0, 1.0, 0.0);
        assert_eq!(tween.apply(0.0), 1.0);
        assert!(tween.is_finished());
    }
}
