//! HTML microsite renderer.
//!
//! Produces one self-contained page (inline styles and script) from a
//! portfolio and its artist. Bio, genres and section content are written
//! into the markup as-is, without escaping; content containing markup is
//! rendered as markup. Callers that accept untrusted content must sanitize
//! it before it is stored.

use chrono::{DateTime, Datelike, Utc};

use super::PortfolioBundle;
use crate::config::Branding;
use crate::db::models::capitalize;

const BASE_STYLES: &str = r#"
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: var(--font-body), sans-serif;
            background-color: var(--dark);
            color: var(--light);
            line-height: 1.6;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            padding: 0 20px;
        }

        header {
            background: linear-gradient(135deg, var(--primary), var(--accent));
            color: white;
            padding: 4rem 0;
            text-align: center;
            position: relative;
            overflow: hidden;
        }

        header::before {
            content: '';
            position: absolute;
            top: 0;
            left: 0;
            right: 0;
            bottom: 0;
            background: url('data:image/svg+xml,<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><circle cx="50" cy="50" r="2" fill="white" opacity="0.1"/></svg>') repeat;
            animation: float 20s infinite linear;
        }

        @keyframes float {
            0% { transform: translateY(0) rotate(0deg); }
            100% { transform: translateY(-100px) rotate(360deg); }
        }

        .profile {
            position: relative;
            z-index: 2;
        }

        .profile-img {
            width: 200px;
            height: 200px;
            border-radius: 50%;
            object-fit: cover;
            border: 5px solid var(--accent);
            box-shadow: 0 10px 30px rgba(0,0,0,0.3);
            margin-bottom: 2rem;
        }

        .profile-placeholder {
            background: linear-gradient(135deg, var(--primary), var(--accent));
            display: flex;
            align-items: center;
            justify-content: center;
            font-size: 2rem;
            color: white;
            margin-left: auto;
            margin-right: auto;
        }

        h1 {
            font-family: var(--font-heading), sans-serif;
            font-size: 3rem;
            font-weight: 700;
            margin-bottom: 1rem;
            text-shadow: 2px 2px 4px rgba(0,0,0,0.3);
        }

        .subtitle {
            font-size: 1.3rem;
            margin-bottom: 0.5rem;
            opacity: 0.9;
        }

        .experience-badge {
            display: inline-block;
            background: rgba(255,255,255,0.2);
            padding: 0.5rem 1rem;
            border-radius: 25px;
            font-size: 0.9rem;
            margin-top: 1rem;
            backdrop-filter: blur(10px);
        }

        nav {
            background: rgba(10, 10, 18, 0.95);
            backdrop-filter: blur(10px);
            position: sticky;
            top: 0;
            z-index: 1000;
            padding: 1rem 0;
        }

        nav ul {
            display: flex;
            justify-content: center;
            list-style: none;
            gap: 2rem;
        }

        nav a {
            color: var(--light);
            text-decoration: none;
            padding: 0.5rem 1rem;
            border-radius: 25px;
            transition: all 0.3s;
        }

        nav a:hover {
            background: var(--primary);
            color: white;
        }

        main {
            padding: 4rem 0;
        }

        section {
            margin-bottom: 4rem;
            padding: 2rem 0;
        }

        h2 {
            font-family: var(--font-heading), sans-serif;
            font-size: 2.5rem;
            color: var(--accent);
            text-align: center;
            margin-bottom: 3rem;
            position: relative;
        }

        h2::after {
            content: '';
            position: absolute;
            bottom: -10px;
            left: 50%;
            transform: translateX(-50%);
            width: 80px;
            height: 4px;
            background: linear-gradient(90deg, var(--primary), var(--accent));
            border-radius: 2px;
        }

        .content-card {
            background: rgba(26, 26, 36, 0.8);
            padding: 2.5rem;
            border-radius: 15px;
            backdrop-filter: blur(10px);
            border: 1px solid rgba(176, 38, 255, 0.2);
            box-shadow: 0 10px 30px rgba(0,0,0,0.2);
            margin-bottom: 2rem;
            transition: transform 0.3s;
        }

        .content-card:hover {
            transform: translateY(-5px);
        }

        .section-body {
            white-space: pre-line;
            font-size: 1.1rem;
            line-height: 1.8;
        }

        .skills-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
            gap: 1rem;
            margin-top: 2rem;
        }

        .skill-tag {
            background: linear-gradient(135deg, var(--primary), var(--accent));
            color: white;
            padding: 1rem;
            border-radius: 10px;
            text-align: center;
            font-weight: 600;
            box-shadow: 0 5px 15px rgba(176, 38, 255, 0.3);
            transition: transform 0.3s;
        }

        .skill-tag:hover {
            transform: scale(1.05);
        }

        .social-links {
            display: flex;
            justify-content: center;
            gap: 2rem;
            margin-top: 2rem;
        }

        .social-links a {
            display: flex;
            align-items: center;
            justify-content: center;
            width: 60px;
            height: 60px;
            background: linear-gradient(135deg, var(--primary), var(--accent));
            color: white;
            border-radius: 50%;
            font-size: 1.5rem;
            text-decoration: none;
            transition: all 0.3s;
            box-shadow: 0 5px 15px rgba(0,0,0,0.2);
        }

        .social-links a:hover {
            transform: translateY(-5px) scale(1.1);
            box-shadow: 0 10px 25px rgba(176, 38, 255, 0.4);
        }

        .contact-info {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
            gap: 2rem;
            margin-top: 2rem;
        }

        .contact-item {
            display: flex;
            align-items: center;
            gap: 1rem;
            padding: 1rem;
            background: rgba(176, 38, 255, 0.1);
            border-radius: 10px;
        }

        .contact-item i {
            font-size: 1.5rem;
            color: var(--accent);
        }

        .contact-item a {
            color: var(--accent);
        }

        footer {
            background: rgba(26, 26, 36, 0.9);
            padding: 3rem 0 1rem;
            text-align: center;
            border-top: 1px solid rgba(176, 38, 255, 0.2);
        }

        .footer-brand {
            font-family: var(--font-heading), sans-serif;
            font-size: 1.5rem;
            margin-bottom: 1rem;
        }

        .footer-brand .highlight {
            color: var(--accent);
        }

        .powered-by {
            color: var(--text-gray);
            font-size: 0.9rem;
            margin-top: 1rem;
        }

        @media (max-width: 768px) {
            h1 { font-size: 2rem; }
            h2 { font-size: 2rem; }
            nav ul { flex-direction: column; align-items: center; }
            .social-links { flex-wrap: wrap; }
            .profile-img { width: 150px; height: 150px; }
        }

        html {
            scroll-behavior: smooth;
        }

        .fade-in {
            opacity: 0;
            transform: translateY(30px);
            animation: fadeInUp 0.8s forwards;
        }

        @keyframes fadeInUp {
            to {
                opacity: 1;
                transform: translateY(0);
            }
        }
"#;

const SCRIPT: &str = r##"
        document.querySelectorAll('nav a[href^="#"]').forEach(anchor => {
            anchor.addEventListener('click', function (e) {
                e.preventDefault();
                const target = document.querySelector(this.getAttribute('href'));
                if (target) {
                    target.scrollIntoView({ behavior: 'smooth', block: 'start' });
                }
            });
        });

        const observer = new IntersectionObserver((entries) => {
            entries.forEach(entry => {
                if (entry.isIntersecting) {
                    entry.target.style.animationDelay = '0.2s';
                    entry.target.classList.add('fade-in');
                }
            });
        }, { threshold: 0.1, rootMargin: '0px 0px -50px 0px' });

        document.querySelectorAll('.fade-in').forEach(el => observer.observe(el));

        window.addEventListener('load', () => {
            document.body.style.opacity = '1';
        });
"##;

/// "KatikaNaMe" -> ("Katika", "NaMe"): split before the second capital.
fn brand_parts(name: &str) -> (&str, &str) {
    let split = name
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    name.split_at(split)
}

fn font_family_param(font: &str) -> String {
    font.trim().replace(' ', "+")
}

/// Icon class for a social platform; "website" gets the generic globe.
fn social_icon(platform: &str) -> &str {
    if platform == "website" {
        "globe"
    } else {
        platform
    }
}

fn category_label(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        "CREATIVE PROFESSIONAL".to_string()
    } else {
        trimmed.replacen('_', " ", 1).to_uppercase()
    }
}

/// Render the microsite document.
pub fn render(bundle: &PortfolioBundle, branding: &Branding, now: DateTime<Utc>) -> String {
    let portfolio = &bundle.portfolio;
    let artist = &bundle.artist;
    let colors = &bundle.customizations.colors;
    let fonts = &bundle.customizations.fonts;

    let about = artist
        .bio
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .or(portfolio.description.as_deref())
        .unwrap_or_default();
    let meta_description = portfolio
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or(artist.bio.as_deref())
        .unwrap_or_default();
    let location = artist.location.display();

    let mut html = String::with_capacity(16 * 1024);

    // Head
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - {title}</title>
    <meta name="description" content="{description}">
    <meta name="keywords" content="{keywords}">
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css">
    <link href="https://fonts.googleapis.com/css2?family={body_font}:wght@400;600&family={heading_font}:wght@700&display=swap" rel="stylesheet">
    <style>
        :root {{
            --primary: {primary};
            --secondary: {secondary};
            --accent: {accent};
            --dark: #0a0a12;
            --light: #f5f5f7;
            --text-gray: #a1a1a6;
            --font-heading: '{heading}';
            --font-body: '{body}';
        }}
"#,
        name = artist.name,
        title = portfolio.title,
        description = meta_description,
        keywords = artist.genres.join(", "),
        body_font = font_family_param(&fonts.body),
        heading_font = font_family_param(&fonts.heading),
        primary = colors.primary,
        secondary = colors.secondary,
        accent = colors.accent,
        heading = fonts.heading,
        body = fonts.body,
    ));
    html.push_str(BASE_STYLES);
    html.push_str("    </style>\n</head>\n<body>\n");

    // Header
    let profile_image = match artist.media.first() {
        Some(media) => format!(
            r#"<img src="{}" alt="{}" class="profile-img">"#,
            media.url, artist.name
        ),
        None => format!(
            r#"<div class="profile-img profile-placeholder">{}</div>"#,
            artist.name.chars().next().map(String::from).unwrap_or_default()
        ),
    };
    let badge_location = location
        .as_deref()
        .map(|l| format!(" \u{2022} {}", l))
        .unwrap_or_default();
    html.push_str(&format!(
        r#"    <header>
        <div class="container">
            <div class="profile">
                {profile_image}
                <h1>{name}</h1>
                <p class="subtitle">{category}</p>
                <div class="experience-badge">
                    {experience} LEVEL{badge_location}
                </div>
            </div>
        </div>
    </header>
"#,
        name = artist.name,
        category = category_label(&artist.category),
        experience = artist.experience.to_uppercase(),
    ));

    // Navigation
    let has_section = |kind: &str| portfolio.sections.iter().any(|s| s.kind == kind);
    html.push_str("    <nav>\n        <div class=\"container\">\n            <ul>\n");
    html.push_str("                <li><a href=\"#about\">About</a></li>\n");
    html.push_str("                <li><a href=\"#skills\">Skills</a></li>\n");
    if has_section("experience") {
        html.push_str("                <li><a href=\"#experience\">Experience</a></li>\n");
    }
    if has_section("gallery") {
        html.push_str("                <li><a href=\"#gallery\">Gallery</a></li>\n");
    }
    html.push_str("                <li><a href=\"#contact\">Contact</a></li>\n");
    html.push_str("            </ul>\n        </div>\n    </nav>\n\n    <main class=\"container\">\n");

    // About
    html.push_str(&format!(
        r#"        <section id="about" class="fade-in">
            <h2>About Me</h2>
            <div class="content-card">
                <p style="font-size: 1.1rem; line-height: 1.8;">{about}</p>
            </div>
        </section>
"#
    ));

    // Skills
    if !artist.genres.is_empty() {
        html.push_str(
            "        <section id=\"skills\" class=\"fade-in\">\n            <h2>Skills &amp; Specialties</h2>\n            <div class=\"skills-grid\">\n",
        );
        for genre in &artist.genres {
            html.push_str(&format!("                <div class=\"skill-tag\">{}</div>\n", genre));
        }
        html.push_str("            </div>\n        </section>\n");
    }

    // Sections
    for section in &portfolio.sections {
        html.push_str(&format!(
            r#"        <section id="{kind}" class="fade-in">
            <h2>{title}</h2>
            <div class="content-card">
                <div class="section-body">{content}</div>
            </div>
        </section>
"#,
            kind = section.kind,
            title = section.display_title(),
            content = section.content,
        ));
    }

    // Contact
    let email = bundle.contact_email().unwrap_or_default();
    html.push_str(&format!(
        r#"        <section id="contact" class="fade-in">
            <h2>Let's Connect</h2>
            <div class="content-card">
                <div class="contact-info">
                    <div class="contact-item">
                        <i class="fas fa-envelope"></i>
                        <div>
                            <strong>Email</strong><br>
                            <a href="mailto:{email}">{email}</a>
                        </div>
                    </div>
"#
    ));
    if let Some(location) = &location {
        html.push_str(&format!(
            r#"                    <div class="contact-item">
                        <i class="fas fa-map-marker-alt"></i>
                        <div>
                            <strong>Location</strong><br>
                            {location}
                        </div>
                    </div>
"#
        ));
    }
    html.push_str("                </div>\n");

    let links: Vec<(&str, &str)> = artist.populated_social_links().collect();
    if !links.is_empty() {
        html.push_str("                <div class=\"social-links\">\n");
        for (platform, url) in links {
            html.push_str(&format!(
                r#"                    <a href="{url}" target="_blank" title="{title}"><i class="fab fa-{icon}"></i></a>"#,
                title = capitalize(platform),
                icon = social_icon(platform),
            ));
            html.push('\n');
        }
        html.push_str("                </div>\n");
    }
    html.push_str("            </div>\n        </section>\n    </main>\n\n");

    // Footer
    let (lead, highlight) = brand_parts(&branding.platform_name);
    html.push_str(&format!(
        r#"    <footer>
        <div class="container">
            <div class="footer-brand">
                <span>{lead}</span><span class="highlight">{highlight}</span>
            </div>
            <p>&copy; {year} {name}. All rights reserved.</p>
            <p class="powered-by">Powered by {platform} Platform</p>
        </div>
    </footer>

    <script>{SCRIPT}    </script>
</body>
</html>
"#,
        year = now.year(),
        name = artist.name,
        platform = branding.platform_name,
    ));

    html
}
