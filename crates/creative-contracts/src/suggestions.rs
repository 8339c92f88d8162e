use rand::seq::SliceRandom;

pub const CAMPAIGN_MESSAGES: &[&str] = &[
    "Discover the power of nature with our eco-friendly cleaning solution. Made with 100% plant-based ingredients, safe for your family and the planet.",
    "Fuel your day with premium organic energy. Packed with superfoods and zero artificial ingredients. Feel the difference.",
    "Transform your mornings with the perfect cup. Ethically sourced, expertly roasted, delivered fresh to your door.",
    "Your fitness journey starts here. Professional-grade equipment meets innovative design. Achieve your goals faster.",
    "Elevate your wellness routine. Premium ingredients, proven results, trusted by thousands. Experience the difference today.",
    "Adventure awaits with gear built to last. Designed for explorers, tested in extreme conditions. Go further with confidence.",
    "Comfort meets style in every thread. Sustainable fabrics, timeless design, uncompromising quality. Wear what matters.",
    "Unlock your potential with cutting-edge technology. Intuitive design meets powerful performance. Stay ahead of the curve.",
    "Nourish your body, fuel your life. Whole food nutrition made simple. Taste the quality in every bite.",
    "Make every moment count. Precision crafted for those who demand excellence. Your time deserves the best.",
    "Refresh naturally. Pure ingredients, bold flavors, zero compromise. Hydration that tastes as good as it feels.",
    "Sleep better, live better. Premium comfort engineered for perfect rest. Wake up refreshed every morning.",
    "Clean beauty that works. Science-backed formulas, nature-inspired ingredients. Radiance from the inside out.",
    "Your productivity partner. Seamlessly integrate work and life with tools designed for modern achievers.",
    "Taste the tradition. Handcrafted quality passed down through generations. Every sip tells a story.",
    "Protect what matters most. Advanced technology meets peace of mind. Trusted by families everywhere.",
    "Simplify your routine. Smart solutions for everyday challenges. More time for what you love.",
    "Premium performance without the premium price. Quality you can trust, value you can feel.",
    "Join the movement. Sustainable choices that make a real impact. Together, we create change.",
    "Experience luxury you can afford. Sophisticated design meets accessible pricing. Elevate your everyday.",
];

pub const ENVIRONMENT_PROMPTS: &[&str] = &[
    "Modern minimalist kitchen with marble countertops and natural sunlight",
    "Cozy living room with plush furniture and warm lighting",
    "Urban rooftop terrace with city skyline in the background",
    "Bright and airy home office with plants and wooden desk",
    "Sleek contemporary bathroom with spa-like atmosphere",
    "Trendy coffee shop interior with exposed brick and vintage decor",
    "Outdoor garden patio with lush greenery and comfortable seating",
    "Professional gym with modern equipment and large windows",
    "Beach boardwalk at sunset with ocean views",
    "Mountain cabin interior with stone fireplace and cozy ambiance",
    "High-end restaurant dining area with elegant table settings",
    "Modern yoga studio with bamboo floors and natural light",
    "Stylish bedroom with neutral tones and contemporary furniture",
    "Industrial loft with high ceilings and exposed pipes",
    "Tropical resort poolside with palm trees and lounge chairs",
    "Rustic farmhouse kitchen with wooden beams and vintage appliances",
    "Futuristic tech workspace with LED lighting and glass walls",
    "Serene meditation room with candles and soft textures",
    "Vibrant art gallery with white walls and spotlights",
    "Outdoor camping scene with tent and mountain backdrop",
];

pub fn random_campaign_message() -> &'static str {
    pick(CAMPAIGN_MESSAGES)
}

pub fn random_environment_prompt() -> &'static str {
    pick(ENVIRONMENT_PROMPTS)
}

fn pick(pool: &'static [&'static str]) -> &'static str {
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_come_from_pools() {
        for _ in 0..50 {
            assert!(CAMPAIGN_MESSAGES.contains(&random_campaign_message()));
            assert!(ENVIRONMENT_PROMPTS.contains(&random_environment_prompt()));
        }
    }
}
