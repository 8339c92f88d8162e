use crate::campaign::AspectRatio;

/// Number of candidate backgrounds produced per environment request.
pub const ENVIRONMENT_VARIATIONS: usize = 4;

/// Ad copy used when a campaign has no message.
pub const FALLBACK_AD_COPY: &str = "Premium product showcase";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductView {
    Front,
    Back,
    Left,
    Right,
    TopDown,
    BottomUp,
}

impl ProductView {
    pub const ALL: [ProductView; 6] = [
        ProductView::Front,
        ProductView::Back,
        ProductView::Left,
        ProductView::Right,
        ProductView::TopDown,
        ProductView::BottomUp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProductView::Front => "front",
            ProductView::Back => "back",
            ProductView::Left => "left",
            ProductView::Right => "right",
            ProductView::TopDown => "top-down",
            ProductView::BottomUp => "bottom-up",
        }
    }

    pub fn angle(self) -> &'static str {
        match self {
            ProductView::Front => "straight-on front view, camera directly facing the front of the product at eye level, showing the primary face/label",
            ProductView::Back => "straight-on back/rear view, camera directly facing the back of the product at eye level, 180 degrees opposite from the front",
            ProductView::Left => "left side profile view, camera positioned 90 degrees to the left of the front view, showing the left edge/side panel",
            ProductView::Right => "right side profile view, camera positioned 90 degrees to the right of the front view, showing the right edge/side panel",
            ProductView::TopDown => "top view looking straight down from directly above the product, showing the top surface as if the camera is mounted on the ceiling",
            ProductView::BottomUp => "bottom view looking straight up from directly below the product, showing the bottom/base surface",
        }
    }
}

pub fn product_view_prompt(product_name: &str, description: &str, view: ProductView) -> String {
    let angle = view.angle();
    format!(
        "Study the provided reference images of this {product_name} product.

Generate a professional product photography shot with this EXACT camera angle: {angle}.

Product details: {description}

CRITICAL REQUIREMENTS:
- The product MUST look identical to the reference images (same shape, size, colors, labels, text, branding)
- Pure white background (#FFFFFF)
- Professional studio lighting with soft shadows
- Camera angle: {angle}
- High resolution, sharp focus
- Photorealistic rendering
- Square aspect ratio (1:1)

Output only the product photograph from the specified angle. Do not include any text, labels, or annotations."
    )
}

pub fn combined_view_prompt(
    product_names: &[String],
    descriptions: &[String],
    view: ProductView,
) -> String {
    let products = product_names.join(" and ");
    let details = descriptions.join(". ");
    let angle = view.angle();
    format!(
        "Study the provided reference images showing multiple products: {products}.

Generate a professional product photography shot showing ALL products together in a single composition with this EXACT camera angle: {angle}.

Products: {details}

CRITICAL REQUIREMENTS:
- Show ALL products together in the same image
- Each product MUST look identical to its reference images (same shape, size, colors, labels, text, branding)
- Arrange products in an aesthetically pleasing composition
- Pure white background (#FFFFFF)
- Professional studio lighting with soft shadows
- Camera angle: {angle}
- High resolution, sharp focus
- Photorealistic rendering
- Square aspect ratio (1:1)

Output only the product photograph from the specified angle showing all products together."
    )
}

/// `variation` is 1-based.
pub fn environment_prompt(description: &str, variation: usize) -> String {
    format!(
        "Create a professional background environment photograph based on this description: {description}

CRITICAL REQUIREMENTS:
- Pure photorealistic environment scene
- No products, no people, just the background setting
- Square aspect ratio (1:1)
- High resolution, sharp focus
- Professional photography quality
- Perfect for product placement in post-production
- Clean, uncluttered composition
- Proper lighting and depth

Variation {variation}: Add subtle variation in camera angle or lighting while maintaining the same overall scene."
    )
}

const LOGO_REQUIREMENTS: &str = "
LOGO PLACEMENT:
- Include the company logo in the composition
- Place logo subtly in a corner or appropriate location
- Logo should be visible but not overwhelming
- Maintain logo clarity and branding
- Typical placement: top-right, top-left, or bottom-right corner
";

/// Ad composition prompt. Reference images are expected in the order
/// environment, product, then logo when `include_logo` is set.
pub fn ad_prompt(ratio: AspectRatio, ad_copy: &str, include_logo: bool) -> String {
    let mut reference_list = "1. Background environment setting (use as the scene/backdrop)\n2. Product photograph (integrate naturally into the scene)".to_string();
    if include_logo {
        reference_list
            .push_str("\n3. Company logo (place subtly in corner or appropriate location)");
    }
    let logo_requirements = if include_logo { LOGO_REQUIREMENTS } else { "" };
    let placement = ratio.placement();
    let size = ratio.size_label();
    let dimensions = ratio.dimensions();

    format!(
        "Create a professional advertising image for {placement} in {size} ({dimensions}) format.

REFERENCE IMAGES PROVIDED:
{reference_list}

CRITICAL COMPOSITION REQUIREMENTS:
- Aspect ratio: {size} ({dimensions})
- Product must be the HERO/FOCAL POINT of the image - prominently featured and clearly visible
- Position product in the FOREGROUND, taking up 40-60% of the frame
- Product should be slightly closer to camera than other scene elements for depth and emphasis
- Use a medium-close composition that highlights product details while showing environment context

PRODUCT INTEGRATION & PERSPECTIVE:
- Match the product's perspective EXACTLY to the environment's viewing angle and camera position
- Ensure product orientation aligns naturally with the scene's vanishing point and horizon line
- The product must appear to physically exist within the 3D space of the environment
- Maintain consistent scale - product should look realistically sized for its placement
- If environment has a surface (table, counter, ground), place product ON that surface naturally
- Product should cast realistic shadows that match the environment's lighting direction
- Reflections and highlights on product must match the environment's light sources

LIGHTING & VISUAL COHERENCE:
- Product lighting MUST match environment lighting exactly (color temperature, intensity, direction)
- Match ambient light color - warm/cool tones should be consistent between product and scene
- Ensure product's highlights and shadows align with environment's light sources
- Add subtle environmental reflections on product surfaces when appropriate
- Professional advertising photography quality with polished, commercial-ready aesthetic
{logo_requirements}
AD COPY TO FEATURE:
\"{ad_copy}\"

TYPOGRAPHY & TEXT DESIGN:
- Place ad copy text prominently but not obscuring the product
- Text should be clear, readable, and professionally styled
- Use modern, bold, clean typography appropriate for premium advertising
- Text placement: typically top or bottom third, avoiding product area
- Consider visual hierarchy: headline bold and large, body text smaller
- Text should complement not compete with the product
- Use colors that contrast well with background for readability

FINAL OUTPUT REQUIREMENTS:
A polished, professional advertisement that:
1. Features the product as the clear hero with prominent placement
2. Integrates product seamlessly into environment with perfect perspective matching
3. Shows natural, realistic lighting and shadows throughout
4. Includes clear, compelling advertising copy
5. Looks like a premium commercial campaign creative ready for publication"
    )
}

/// Message actually rendered into an ad: the campaign message, or the
/// fallback copy when the message is blank.
pub fn ad_copy_or_fallback(message: &str) -> &str {
    if message.trim().is_empty() {
        FALLBACK_AD_COPY
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_are_six_distinct_names() {
        let mut names: Vec<&str> = ProductView::ALL.iter().map(|view| view.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn product_view_prompt_interpolates_fields() {
        let prompt = product_view_prompt("Acme Soap", "Plant-based bar", ProductView::TopDown);
        assert!(prompt.starts_with("Study the provided reference images of this Acme Soap product."));
        assert!(prompt.contains("Product details: Plant-based bar"));
        assert_eq!(prompt.matches(ProductView::TopDown.angle()).count(), 2);
        assert_eq!(
            prompt,
            product_view_prompt("Acme Soap", "Plant-based bar", ProductView::TopDown)
        );
    }

    #[test]
    fn combined_prompt_joins_names_and_descriptions() {
        let prompt = combined_view_prompt(
            &["Soap".to_string(), "Sponge".to_string()],
            &["Bar".to_string(), "Natural".to_string()],
            ProductView::Front,
        );
        assert!(prompt.contains("multiple products: Soap and Sponge."));
        assert!(prompt.contains("Products: Bar. Natural"));
    }

    #[test]
    fn environment_prompt_numbers_variation() {
        let prompt = environment_prompt("Sunny kitchen", 3);
        assert!(prompt.contains("based on this description: Sunny kitchen"));
        assert!(prompt.ends_with(
            "Variation 3: Add subtle variation in camera angle or lighting while maintaining the same overall scene."
        ));
    }

    #[test]
    fn ad_prompt_mentions_logo_only_when_included() {
        let without = ad_prompt(AspectRatio::Vertical, "Buy now", false);
        assert!(without.contains("Instagram Stories, TikTok, and Reels in 9:16 vertical (1080x1920)"));
        assert!(without.contains("\"Buy now\""));
        assert!(!without.contains("LOGO PLACEMENT"));
        assert!(!without.contains("3. Company logo"));

        let with = ad_prompt(AspectRatio::Vertical, "Buy now", true);
        assert!(with.contains("LOGO PLACEMENT"));
        assert!(with.contains("3. Company logo"));
    }

    #[test]
    fn blank_message_uses_fallback_copy() {
        assert_eq!(ad_copy_or_fallback("   "), FALLBACK_AD_COPY);
        assert_eq!(ad_copy_or_fallback("Hello"), "Hello");
    }
}
