use crate::markup::template::template_string;

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_strips_volatile_attributes() {
        let html = r#"<div id="card-17" class="card" name="promo" style="color: red"><span>Hi</span></div>"#;
        assert_eq!(
            template_string(html),
            r#"<div class="card"><span>Hi</span></div>"#
        );
    }

    #[test]
    fn test_removes_script_link_style_subtrees() {
        let html = r#"<div class="box"><script>track(1)</script><style>.a{}</style><link rel="x"><p>Body</p></div>"#;
        assert_eq!(template_string(html), r#"<div class="box"><p>Body</p></div>"#);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let a = "<ul>\n  <li>One</li>\n  <li>Two</li>\n</ul>";
        let b = "<ul><li>One</li><li>Two</li></ul>";
        assert_eq!(template_string(a), template_string(b));
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let html = r#"<div><img src="a.png" id="hero"><br></div>"#;
        assert_eq!(template_string(html), r#"<div><img src="a.png"><br></div>"#);
    }

    #[test]
    fn test_instances_of_same_component_share_template() {
        let first = r#"<article id="post-1" class="post"><h2>Title one</h2></article>"#;
        let second = r#"<article id="post-2" class="post"><h2>Title one</h2></article>"#;
        assert_eq!(template_string(first), template_string(second));
    }

    #[test]
    fn test_attributes_are_ordered_by_name() {
        let a = r#"<a title="t" href="/x" class="link">x</a>"#;
        let b = r#"<a class="link" href="/x" title="t">x</a>"#;
        assert_eq!(template_string(a), template_string(b));
        assert_eq!(
            template_string(a),
            r#"<a class="link" href="/x" title="t">x</a>"#
        );
    }

    #[test]
    fn test_empty_markup() {
        assert_eq!(template_string(""), "");
        assert_eq!(template_string("   "), "");
    }

    #[test]
    fn test_table_row_keeps_its_structure() {
        let html = r#"<tr id="r1"><td><span>Lamp</span></td><td>$10</td></tr>"#;
        assert_eq!(
            template_string(html),
            "<tr><td><span>Lamp</span></td><td>$10</td></tr>"
        );
    }

    #[test]
    fn test_cells_and_options_keep_their_tags() {
        assert_eq!(
            template_string(r#"<td class="price"><b>$10</b></td>"#),
            r#"<td class="price"><b>$10</b></td>"#
        );
        assert_eq!(
            template_string(r#"<option value="a" id="o1">Apple</option>"#),
            r#"<option value="a">Apple</option>"#
        );
        assert_eq!(
            template_string("<tbody><tr><td>1</td></tr></tbody>"),
            "<tbody><tr><td>1</td></tr></tbody>"
        );
    }
}
