use std::str::FromStr;

use restop_core::{Discriminant, RestopError, RestopResult};
use roxmltree::Node as XmlNode;

use crate::bdt::{Bdt, BoostType, DecisionTree, Leaf, Node};

fn invalid(model: &str, reason: impl Into<String>) -> RestopError {
    RestopError::ModelFormat {
        model: model.to_string(),
        reason: reason.into(),
    }
}

fn child<'a, 'input>(
    node: XmlNode<'a, 'input>,
    tag: &str,
    model: &str,
) -> RestopResult<XmlNode<'a, 'input>> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .ok_or_else(|| invalid(model, format!("missing <{tag}> element")))
}

fn attribute<T: FromStr>(node: XmlNode, name: &str, model: &str) -> RestopResult<T> {
    let text = node.attribute(name).ok_or_else(|| {
        invalid(
            model,
            format!("<{}> is missing the {name} attribute", node.tag_name().name()),
        )
    })?;
    text.trim().parse::<T>().map_err(|_| {
        invalid(
            model,
            format!(
                "<{}> has an unreadable {name} attribute \"{text}\"",
                node.tag_name().name()
            ),
        )
    })
}

/// Parse the contents of a TMVA `MethodSetup` document for a BDT classifier.
///
/// Only the parts needed for evaluation are read: the boosting options, the ordered list of
/// input variables, and the trees under `<Weights>`. Weight files that apply input
/// transformations or were trained for regression are rejected.
pub fn parse_weights(text: &str, name: &str) -> RestopResult<Bdt> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name("MethodSetup") {
        return Err(invalid(
            name,
            format!(
                "expected a <MethodSetup> document, found <{}>",
                root.tag_name().name()
            ),
        ));
    }
    let method = root.attribute("Method").unwrap_or_default();
    if !method.starts_with("BDT") {
        return Err(invalid(name, format!("method \"{method}\" is not a BDT")));
    }

    let boost_type = read_boost_type(root, name)?;
    let variables = read_variables(root, name)?;

    if let Some(transformations) = root
        .children()
        .find(|n| n.has_tag_name("Transformations"))
    {
        let n_transformations: usize = attribute(transformations, "NTransformations", name)?;
        if n_transformations > 0 {
            return Err(invalid(
                name,
                format!("{n_transformations} input transformation(s) are not supported"),
            ));
        }
    }

    let weights = child(root, "Weights", name)?;
    if let Some(analysis_type) = weights.attribute("AnalysisType") {
        if analysis_type.trim() != "0" {
            return Err(invalid(
                name,
                format!("analysis type {analysis_type} is not a classification"),
            ));
        }
    }
    let trees = weights
        .children()
        .filter(|n| n.has_tag_name("BinaryTree"))
        .map(|tree| read_tree(tree, name))
        .collect::<RestopResult<Vec<_>>>()?;
    if let Some(n_trees) = weights.attribute("NTrees") {
        if n_trees.trim().parse::<usize>().ok() != Some(trees.len()) {
            return Err(invalid(
                name,
                format!("NTrees = {n_trees} but {} trees were found", trees.len()),
            ));
        }
    }

    let bdt = Bdt::new(name, variables, boost_type, trees)?;
    tracing::debug!(
        model = name,
        variables = bdt.variables().len(),
        trees = bdt.n_trees(),
        boost = ?bdt.boost_type(),
        "loaded TMVA BDT"
    );
    Ok(bdt)
}

fn read_option<'a>(root: XmlNode<'a, '_>, option: &str) -> Option<&'a str> {
    root.children()
        .find(|n| n.has_tag_name("Options"))?
        .children()
        .filter(|n| n.has_tag_name("Option"))
        .find(|n| n.attribute("name") == Some(option))?
        .text()
        .map(str::trim)
}

fn read_boost_type(root: XmlNode, model: &str) -> RestopResult<BoostType> {
    // TMVA's defaults when the options are absent
    let boost = read_option(root, "BoostType").unwrap_or("AdaBoost");
    let yes_no_leaf = match read_option(root, "UseYesNoLeaf").unwrap_or("True") {
        "True" | "true" | "1" => true,
        "False" | "false" | "0" => false,
        other => {
            return Err(invalid(
                model,
                format!("UseYesNoLeaf has an unreadable value \"{other}\""),
            ))
        }
    };
    Ok(if boost == "Grad" {
        BoostType::Grad
    } else {
        BoostType::Weighted { yes_no_leaf }
    })
}

fn read_variables(root: XmlNode, model: &str) -> RestopResult<Vec<String>> {
    let variables_node = child(root, "Variables", model)?;
    let mut variables = variables_node
        .children()
        .filter(|n| n.has_tag_name("Variable"))
        .map(|n| {
            let index: usize = attribute(n, "VarIndex", model)?;
            let expression = n
                .attribute("Expression")
                .or_else(|| n.attribute("Internal"))
                .or_else(|| n.attribute("Label"))
                .ok_or_else(|| invalid(model, format!("variable {index} has no name")))?;
            Ok((index, expression.trim().to_string()))
        })
        .collect::<RestopResult<Vec<_>>>()?;
    variables.sort_by_key(|(index, _)| *index);
    if variables
        .iter()
        .enumerate()
        .any(|(position, (index, _))| position != *index)
    {
        return Err(invalid(model, "variable indices are not contiguous"));
    }
    let n_var: usize = attribute(variables_node, "NVar", model)?;
    if n_var != variables.len() {
        return Err(invalid(
            model,
            format!("NVar = {n_var} but {} variables were found", variables.len()),
        ));
    }
    Ok(variables.into_iter().map(|(_, name)| name).collect())
}

fn read_tree(tree: XmlNode, model: &str) -> RestopResult<DecisionTree> {
    let boost_weight: f64 = attribute(tree, "boostWeight", model)?;
    let root = child(tree, "Node", model)?;
    let mut nodes = Vec::new();
    push_node(root, &mut nodes, model)?;
    Ok(DecisionTree::new(boost_weight, nodes))
}

// Flattens the subtree in pre-order, so children always follow their parent.
fn push_node(node: XmlNode, nodes: &mut Vec<Node>, model: &str) -> RestopResult<usize> {
    let index = nodes.len();
    let daughter = |pos: &str| {
        node.children()
            .find(|n| n.has_tag_name("Node") && n.attribute("pos") == Some(pos))
    };
    let leaf = Leaf {
        response: attribute(node, "res", model)?,
        purity: attribute(node, "purity", model)?,
        node_type: attribute(node, "nType", model)?,
    };
    match (daughter("l"), daughter("r")) {
        (None, None) => {
            nodes.push(Node::Leaf(leaf));
        }
        (Some(left_node), Some(right_node)) => {
            let variable: i64 = attribute(node, "IVar", model)?;
            let variable = usize::try_from(variable).map_err(|_| {
                invalid(model, format!("internal node cuts on variable {variable}"))
            })?;
            let cut: f64 = attribute(node, "Cut", model)?;
            let cut_type: i32 = attribute(node, "cType", model)?;
            // placeholder until the children have been numbered
            nodes.push(Node::Leaf(leaf));
            let left = push_node(left_node, nodes, model)?;
            let right = push_node(right_node, nodes, model)?;
            nodes[index] = Node::Split {
                variable,
                cut,
                cut_type: cut_type == 1,
                left,
                right,
            };
        }
        _ => return Err(invalid(model, "internal node with a single daughter")),
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use restop_core::Discriminant;

    use super::*;
    use crate::bdt::TEST_WEIGHTS;

    #[test]
    fn test_parse_weights() {
        let bdt = parse_weights(TEST_WEIGHTS, "BDT").unwrap();
        assert_eq!(bdt.name(), "BDT");
        assert_eq!(bdt.variables(), ["var_wcand_mass", "var_topcand_mass"]);
        assert_eq!(bdt.boost_type(), BoostType::Grad);
        assert_eq!(bdt.n_trees(), 2);
        let first = &bdt.trees()[0];
        assert_eq!(first.nodes().len(), 5);
        assert!(matches!(
            first.nodes()[0],
            Node::Split {
                variable: 0,
                left: 1,
                right: 2,
                cut_type: true,
                ..
            }
        ));
        assert!(matches!(
            first.nodes()[2],
            Node::Split {
                variable: 1,
                left: 3,
                right: 4,
                ..
            }
        ));
        assert!(matches!(first.nodes()[4], Node::Leaf(Leaf { node_type: 1, .. })));
    }

    #[test]
    fn test_default_boost_is_weighted_vote() {
        let text = TEST_WEIGHTS.replace(
            r#"<Option name="BoostType" modified="Yes">Grad</Option>"#,
            "",
        );
        let bdt = parse_weights(&text, "BDT").unwrap();
        assert_eq!(bdt.boost_type(), BoostType::Weighted { yes_no_leaf: true });
        // both trees vote "signal" for a good candidate
        assert_eq!(bdt.compute(&[80.0, 175.0]), 1.0);
        let text = text.replace(
            r#"<Option name="UseYesNoLeaf" modified="No">True</Option>"#,
            r#"<Option name="UseYesNoLeaf" modified="Yes">False</Option>"#,
        );
        let bdt = parse_weights(&text, "BDT").unwrap();
        assert_eq!(bdt.boost_type(), BoostType::Weighted { yes_no_leaf: false });
    }

    #[test]
    fn test_reject_malformed_xml() {
        assert!(matches!(
            parse_weights("<MethodSetup Method=\"BDT::BDT\">", "BDT"),
            Err(RestopError::XmlError(_))
        ));
    }

    #[test]
    fn test_reject_other_documents() {
        assert!(matches!(
            parse_weights("<Channel Name=\"sr\"/>", "BDT"),
            Err(RestopError::ModelFormat { .. })
        ));
        let mlp = TEST_WEIGHTS.replace("BDT::BDT", "MLP::MLP");
        assert!(parse_weights(&mlp, "MLP").is_err());
    }

    #[test]
    fn test_reject_inconsistent_counts() {
        let text = TEST_WEIGHTS.replace("<Variables NVar=\"2\">", "<Variables NVar=\"3\">");
        assert!(parse_weights(&text, "BDT").is_err());
        let text = TEST_WEIGHTS.replace("<Weights NTrees=\"2\"", "<Weights NTrees=\"3\"");
        assert!(parse_weights(&text, "BDT").is_err());
    }

    #[test]
    fn test_reject_transformations_and_regression() {
        let text = TEST_WEIGHTS.replace(
            "<Transformations NTransformations=\"0\"/>",
            "<Transformations NTransformations=\"1\"/>",
        );
        assert!(parse_weights(&text, "BDT").is_err());
        let text = TEST_WEIGHTS.replace("AnalysisType=\"0\"", "AnalysisType=\"1\"");
        assert!(parse_weights(&text, "BDT").is_err());
    }

    #[test]
    fn test_reject_bad_split_variable() {
        let text = TEST_WEIGHTS.replacen("IVar=\"0\"", "IVar=\"7\"", 1);
        assert!(matches!(
            parse_weights(&text, "BDT"),
            Err(RestopError::ModelFormat { .. })
        ));
    }

    #[test]
    fn test_reject_missing_attribute() {
        let text = TEST_WEIGHTS.replacen(" boostWeight=\"1.0000000000000000e+00\"", "", 1);
        assert!(parse_weights(&text, "BDT").is_err());
    }

    #[test]
    fn test_reject_non_finite_values() {
        let text = TEST_WEIGHTS.replacen("res=\"2.9999999999999999e-01\"", "res=\"nan\"", 1);
        assert!(matches!(
            parse_weights(&text, "BDT"),
            Err(RestopError::ModelFormat { .. })
        ));
        let text = TEST_WEIGHTS.replacen(
            "purity=\"9.0000000000000002e-01\"",
            "purity=\"inf\"",
            1,
        );
        assert!(parse_weights(&text, "BDT").is_err());
        let text = TEST_WEIGHTS.replacen(
            "boostWeight=\"1.0000000000000000e+00\"",
            "boostWeight=\"inf\"",
            1,
        );
        assert!(matches!(
            parse_weights(&text, "BDT"),
            Err(RestopError::ModelFormat { .. })
        ));
    }
}
